//! Demo scene: a ground and objects dropped onto it on command

mod demo_app;

pub use demo_app::DemoApp;

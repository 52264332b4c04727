//! Surface properties for contact resolution

/// Friction and restitution of a collision object's surface
///
/// Every collision object carries one. When two objects touch, the solver
/// combines both surfaces with [`PhysicsMaterial::combine`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhysicsMaterial {
    /// Friction coefficient (0.0 = frictionless)
    pub friction: f32,
    /// Restitution/bounciness (0.0 = no bounce, 1.0 = perfect bounce)
    pub restitution: f32,
}

impl Default for PhysicsMaterial {
    fn default() -> Self {
        Self {
            friction: 0.5,
            restitution: 0.0,
        }
    }
}

/// Upper bound for combined friction
pub const MAX_FRICTION: f32 = 10.0;

impl PhysicsMaterial {
    /// Ice-like material: very low friction, slight bounce
    pub const ICE: Self = Self {
        friction: 0.05,
        restitution: 0.1,
    };

    /// Rubber-like material: high friction, very bouncy
    pub const RUBBER: Self = Self {
        friction: 0.9,
        restitution: 0.8,
    };

    /// Concrete-like material: high friction, very low bounce
    pub const CONCRETE: Self = Self {
        friction: 0.7,
        restitution: 0.1,
    };

    /// Create a new material
    ///
    /// Friction is clamped to `[0, MAX_FRICTION]`, restitution to `[0, 1]`.
    pub fn new(friction: f32, restitution: f32) -> Self {
        Self {
            friction: friction.clamp(0.0, MAX_FRICTION),
            restitution: restitution.clamp(0.0, 1.0),
        }
    }

    /// Combine two surfaces for contact resolution
    ///
    /// Both coefficients multiply, so a frictionless or perfectly inelastic
    /// surface dominates whatever it touches.
    pub fn combine(&self, other: &Self) -> Self {
        Self {
            friction: (self.friction * other.friction).clamp(0.0, MAX_FRICTION),
            restitution: self.restitution * other.restitution,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_material() {
        let material = PhysicsMaterial::default();
        assert_eq!(material.friction, 0.5);
        assert_eq!(material.restitution, 0.0);
    }

    #[test]
    fn test_new_clamps_values() {
        let material = PhysicsMaterial::new(15.0, -0.5);
        assert_eq!(material.friction, MAX_FRICTION);
        assert_eq!(material.restitution, 0.0);

        let material = PhysicsMaterial::new(-1.0, 2.0);
        assert_eq!(material.friction, 0.0);
        assert_eq!(material.restitution, 1.0);
    }

    #[test]
    fn test_combine_multiplies() {
        let combined = PhysicsMaterial::new(0.5, 0.5).combine(&PhysicsMaterial::new(0.4, 0.8));
        assert!((combined.friction - 0.2).abs() < 0.0001);
        assert!((combined.restitution - 0.4).abs() < 0.0001);
    }

    #[test]
    fn test_inelastic_surface_dominates() {
        let combined = PhysicsMaterial::RUBBER.combine(&PhysicsMaterial::default());
        assert_eq!(combined.restitution, 0.0);
    }

    #[test]
    fn test_combine_is_commutative() {
        let a = PhysicsMaterial::ICE;
        let b = PhysicsMaterial::CONCRETE;
        assert_eq!(a.combine(&b), b.combine(&a));
    }
}

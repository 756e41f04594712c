//! Identity registry lifecycle tests.

use std::collections::HashSet;

use block_claim_server::identity::{IdentityRegistry, RenameError};

#[test]
fn registered_identities_get_distinct_palette_colors_while_available() {
    let registry = IdentityRegistry::new();

    let mut colors = HashSet::new();
    for _ in 0..30 {
        let identity = registry.register();
        assert!(
            identity.color.starts_with('#'),
            "palette colors come first, got {}",
            identity.color
        );
        assert!(colors.insert(identity.color), "palette colors must not repeat");
    }

    // Palette exhausted: the registry still assigns, procedurally
    let overflow = registry.register();
    assert!(overflow.color.starts_with("hsl("), "got {}", overflow.color);
}

#[test]
fn unregister_releases_the_color_back_to_the_pool() {
    let registry = IdentityRegistry::new();

    let identities: Vec<_> = (0..30).map(|_| registry.register()).collect();
    let released = identities[7].clone();
    registry.unregister(released.id).unwrap();

    // With exactly one palette color free again, the next registration takes it
    let next = registry.register();
    assert_eq!(next.color, released.color);
}

#[test]
fn unregister_is_none_for_unknown_identity() {
    let registry = IdentityRegistry::new();
    let identity = registry.register();

    assert!(registry.unregister(identity.id).is_some());
    assert!(registry.unregister(identity.id).is_none());
    assert_eq!(registry.connected_count(), 0);
}

#[test]
fn rename_rejects_empty_and_unknown() {
    let registry = IdentityRegistry::new();
    let identity = registry.register();

    assert_eq!(
        registry.rename(identity.id, "   ").unwrap_err(),
        RenameError::EmptyName
    );
    assert_eq!(registry.get(identity.id).unwrap().name, identity.name);

    registry.unregister(identity.id);
    assert_eq!(
        registry.rename(identity.id, "Bear2").unwrap_err(),
        RenameError::UnknownIdentity
    );
}

#[test]
fn claim_count_increments_only_while_connected() {
    let registry = IdentityRegistry::new();
    let identity = registry.register();

    registry.increment_claim_count(identity.id);
    registry.increment_claim_count(identity.id);
    assert_eq!(registry.get(identity.id).unwrap().claim_count, 2);

    registry.unregister(identity.id);
    registry.increment_claim_count(identity.id); // no-op, no panic
    assert!(registry.get(identity.id).is_none());
}

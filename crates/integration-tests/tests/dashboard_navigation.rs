//! Dashboard navigation restore and section switching.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::Arc;

use storefront_state::images::NoImageLookup;
use storefront_state::persistence::keys;
use storefront_state_core::{DashboardSection, EntityId, UserId};
use storefront_state_integration_tests::TempDataDir;

#[test]
fn test_fresh_install_starts_on_overview() {
    let dir = TempDataDir::new();
    let state = dir.open_state(Arc::new(NoImageLookup));
    let nav = state.navigation();

    assert_eq!(nav.section(), DashboardSection::Overview);
    assert!(nav.selected_entity().is_none());
    assert!(nav.selected_user().is_none());
}

#[test]
fn test_navigation_restored_after_reload() {
    let dir = TempDataDir::new();
    {
        let state = dir.open_state(Arc::new(NoImageLookup));
        state.with_navigation(|nav| {
            nav.change_section(DashboardSection::Orders, Some(EntityId::from("o-1042")));
            nav.select_user(Some(UserId::from("u-7")));
        });
    }

    let state = dir.open_state(Arc::new(NoImageLookup));
    let nav = state.navigation();
    assert_eq!(nav.section(), DashboardSection::Orders);
    assert_eq!(nav.selected_entity().map(EntityId::as_str), Some("o-1042"));
    assert_eq!(nav.selected_user().map(UserId::as_str), Some("u-7"));
}

#[test]
fn test_switching_section_clears_entity_across_reload() {
    let dir = TempDataDir::new();
    {
        let state = dir.open_state(Arc::new(NoImageLookup));
        state.with_navigation(|nav| {
            nav.change_section(DashboardSection::Products, Some(EntityId::from("p-1")));
            nav.change_section(DashboardSection::Inventory, None);
        });
        assert!(state.persistence().load_raw(keys::SELECTED_ENTITY_ID).is_none());
    }

    let state = dir.open_state(Arc::new(NoImageLookup));
    let nav = state.navigation();
    assert_eq!(nav.section(), DashboardSection::Inventory);
    assert!(nav.selected_entity().is_none());
}

#[test]
fn test_reopening_same_section_keeps_entity() {
    let dir = TempDataDir::new();
    let state = dir.open_state(Arc::new(NoImageLookup));
    state.with_navigation(|nav| {
        nav.change_section(DashboardSection::Clients, Some(EntityId::from("c-3")));
        nav.change_section(DashboardSection::Clients, None);
    });

    assert_eq!(
        state.navigation().selected_entity().map(EntityId::as_str),
        Some("c-3")
    );
}

#[test]
fn test_unknown_persisted_section_falls_back_to_overview() {
    let dir = TempDataDir::new();
    {
        let state = dir.open_state(Arc::new(NoImageLookup));
        assert!(
            state
                .persistence()
                .save_raw(keys::CURRENT_DASHBOARD_SECTION, "reports")
        );
    }

    let state = dir.open_state(Arc::new(NoImageLookup));
    assert_eq!(state.navigation().section(), DashboardSection::Overview);
}

#[test]
fn test_section_persisted_as_plain_string() {
    let dir = TempDataDir::new();
    let state = dir.open_state(Arc::new(NoImageLookup));
    state.with_navigation(|nav| nav.change_section(DashboardSection::Settings, None));

    assert_eq!(
        state
            .persistence()
            .load_raw(keys::CURRENT_DASHBOARD_SECTION)
            .as_deref(),
        Some("settings")
    );
}

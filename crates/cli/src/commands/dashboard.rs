//! Dashboard navigation commands.

use storefront_state::{AppError, AppState, NavigationState};
use storefront_state_core::{DashboardSection, EntityId, UserId};
use tracing::info;

/// Show the current section and selections.
pub fn show(state: &AppState) {
    log_navigation(&state.navigation());
}

/// Switch section, optionally selecting an entity in it.
///
/// # Errors
///
/// Returns an error if the section name is unknown.
pub fn open(state: &AppState, section: &str, entity: Option<String>) -> Result<(), AppError> {
    let section: DashboardSection = section.parse().map_err(AppError::BadRequest)?;
    let entity = entity.map(EntityId::from);

    let navigation = state.with_navigation(|nav| {
        nav.change_section(section, entity);
        nav.clone()
    });
    log_navigation(&navigation);
    Ok(())
}

/// Select an entity in the current section, or clear the selection.
pub fn select_entity(state: &AppState, id: Option<String>) {
    let navigation = state.with_navigation(|nav| {
        nav.select_entity(id.map(EntityId::from));
        nav.clone()
    });
    log_navigation(&navigation);
}

/// Select a user, or clear the selection.
pub fn select_user(state: &AppState, id: Option<String>) {
    let navigation = state.with_navigation(|nav| {
        nav.select_user(id.map(UserId::from));
        nav.clone()
    });
    log_navigation(&navigation);
}

fn log_navigation(navigation: &NavigationState) {
    info!(
        section = %navigation.section(),
        entity = navigation.selected_entity().map_or("-", EntityId::as_str),
        user = navigation.selected_user().map_or("-", UserId::as_str),
        "Dashboard position"
    );
}

//! Admin dashboard navigation state.
//!
//! Tracks the active section plus an optional selected sub-entity and user,
//! persisted under plain-string keys so a reload lands where the admin left
//! off. Only one section is active at a time.

use storefront_state_core::{DashboardSection, EntityId, UserId};
use tracing::{debug, warn};

use crate::error::add_breadcrumb;
use crate::persistence::{Persistence, keys};

/// Where the admin is in the dashboard.
#[derive(Debug, Clone)]
pub struct NavigationState {
    section: DashboardSection,
    selected_entity: Option<EntityId>,
    selected_user: Option<UserId>,
    persistence: Persistence,
}

impl NavigationState {
    /// Restore navigation from persistence.
    ///
    /// An absent or unrecognised section falls back to the default section.
    #[must_use]
    pub fn load(persistence: Persistence) -> Self {
        let section = persistence
            .load_raw(keys::CURRENT_DASHBOARD_SECTION)
            .and_then(|raw| match raw.parse::<DashboardSection>() {
                Ok(section) => Some(section),
                Err(e) => {
                    warn!(error = %e, "Ignoring persisted dashboard section");
                    None
                }
            })
            .unwrap_or_default();
        let selected_entity = persistence
            .load_raw(keys::SELECTED_ENTITY_ID)
            .filter(|raw| !raw.is_empty())
            .map(EntityId::from);
        let selected_user = persistence
            .load_raw(keys::SELECTED_USER_ID)
            .filter(|raw| !raw.is_empty())
            .map(UserId::from);

        debug!(%section, "Dashboard navigation restored");
        Self {
            section,
            selected_entity,
            selected_user,
            persistence,
        }
    }

    #[must_use]
    pub const fn section(&self) -> DashboardSection {
        self.section
    }

    #[must_use]
    pub const fn selected_entity(&self) -> Option<&EntityId> {
        self.selected_entity.as_ref()
    }

    #[must_use]
    pub const fn selected_user(&self) -> Option<&UserId> {
        self.selected_user.as_ref()
    }

    /// Switch to `section`, optionally selecting a sub-entity in it.
    ///
    /// A supplied `entity_id` always becomes the selection. Without one, the
    /// selection is cleared only when the section actually changes.
    pub fn change_section(&mut self, section: DashboardSection, entity_id: Option<EntityId>) {
        let changed = section != self.section;

        match entity_id {
            Some(entity_id) => self.selected_entity = Some(entity_id),
            None if changed => self.selected_entity = None,
            None => {}
        }
        self.section = section;

        self.persistence
            .save_raw(keys::CURRENT_DASHBOARD_SECTION, section.as_str());
        self.persist_entity();

        add_breadcrumb(
            "navigation",
            "Changed dashboard section",
            Some(&[("section", section.as_str())]),
        );
        debug!(%section, changed, entity = ?self.selected_entity, "Dashboard section changed");
    }

    /// Select (or clear) the sub-entity within the current section.
    pub fn select_entity(&mut self, entity_id: Option<EntityId>) {
        self.selected_entity = entity_id;
        self.persist_entity();
    }

    /// Select (or clear) the user being inspected.
    pub fn select_user(&mut self, user_id: Option<UserId>) {
        self.selected_user = user_id;
        self.persistence.save_optional_raw(
            keys::SELECTED_USER_ID,
            self.selected_user.as_ref().map(UserId::as_str),
        );
    }

    fn persist_entity(&self) {
        self.persistence.save_optional_raw(
            keys::SELECTED_ENTITY_ID,
            self.selected_entity.as_ref().map(EntityId::as_str),
        );
    }
}

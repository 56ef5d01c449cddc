use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum NavigationDecision {
    Proceed,
    Confirm,
}

/// Answer of the admin to the "unsaved changes" prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LeaveChoice {
    Discard,
    SaveThenLeave,
    Stay,
}

/// What the caller has to do with a pending navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum GuardResolution {
    Leave,
    SaveThenLeave,
    Stay,
    /// ask the admin first
    Ask,
}

/// Blocks leaving a form with unsaved work.
///
/// Nothing is blocked once the last save has landed and the form is clean.
#[derive(Debug, Clone, Copy)]
pub struct NavigationGuard {
    dirty: bool,
    save_in_flight: bool,
}

impl NavigationGuard {
    pub fn new(dirty: bool, save_in_flight: bool) -> Self {
        Self {
            dirty,
            save_in_flight,
        }
    }

    pub fn decision(&self) -> NavigationDecision {
        if self.dirty || self.save_in_flight {
            NavigationDecision::Confirm
        } else {
            NavigationDecision::Proceed
        }
    }

    /// Whether the browser should show its own "leave site?" prompt on close or reload.
    pub fn before_unload(&self) -> bool {
        self.decision() == NavigationDecision::Confirm
    }

    pub fn resolve(&self, choice: Option<LeaveChoice>) -> GuardResolution {
        match (self.decision(), choice) {
            (NavigationDecision::Proceed, _) => GuardResolution::Leave,
            (NavigationDecision::Confirm, None) => GuardResolution::Ask,
            (NavigationDecision::Confirm, Some(LeaveChoice::Discard)) => GuardResolution::Leave,
            (NavigationDecision::Confirm, Some(LeaveChoice::SaveThenLeave)) => {
                GuardResolution::SaveThenLeave
            }
            (NavigationDecision::Confirm, Some(LeaveChoice::Stay)) => GuardResolution::Stay,
        }
    }

    /// Runs `navigate` only when the resolution lets the admin leave right away.
    pub fn intercept<T>(&self, choice: Option<LeaveChoice>, navigate: impl FnOnce() -> T) -> Result<T, GuardResolution> {
        match self.resolve(choice) {
            GuardResolution::Leave => Ok(navigate()),
            other => Err(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_form_leaves_freely() {
        let guard = NavigationGuard::new(false, false);
        assert_eq!(guard.decision(), NavigationDecision::Proceed);
        assert!(!guard.before_unload());
        assert_eq!(guard.intercept(None, || "left"), Ok("left"));
    }

    #[test]
    fn test_dirty_form_asks_first() {
        let guard = NavigationGuard::new(true, false);
        assert!(guard.before_unload());
        assert_eq!(guard.resolve(None), GuardResolution::Ask);
        assert_eq!(guard.resolve(Some(LeaveChoice::Discard)), GuardResolution::Leave);
        assert_eq!(
            guard.resolve(Some(LeaveChoice::SaveThenLeave)),
            GuardResolution::SaveThenLeave
        );
        assert_eq!(guard.intercept(Some(LeaveChoice::Stay), || ()), Err(GuardResolution::Stay));
    }

    #[test]
    fn test_save_in_flight_blocks_even_when_clean() {
        let guard = NavigationGuard::new(false, true);
        assert_eq!(guard.decision(), NavigationDecision::Confirm);
    }
}

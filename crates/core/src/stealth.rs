//! Overlay visibility, position and capture-exclusion attributes.

use crate::command::Direction;
use crate::config::OverlayConfig;
use crate::geometry::Point;
use crate::platform::{ExStyle, WindowService};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Hidden,
    Visible,
}

/// Owns the overlay window state. Starts `Hidden` at the configured
/// initial position.
#[derive(Debug)]
pub struct OverlayController {
    visibility: Visibility,
    position: Point,
    step: i32,
    alpha: u8,
}

impl OverlayController {
    pub fn new(config: &OverlayConfig) -> Self {
        Self {
            visibility: Visibility::Hidden,
            position: config.initial_position,
            step: config.move_step,
            alpha: config.alpha,
        }
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn position(&self) -> Point {
        self.position
    }

    /// Applies style bits, alpha and capture exclusion to a freshly created
    /// window. Each failure is logged and skipped.
    pub fn setup<W: WindowService + ?Sized>(&self, service: &mut W) {
        match service.ex_style() {
            Ok(style) => {
                if let Err(e) = service.set_ex_style(style | ExStyle::OVERLAY) {
                    log::warn!("Failed to set overlay window style: {}", e);
                }
            }
            Err(e) => log::warn!("Failed to read window style: {}", e),
        }
        if let Err(e) = service.set_alpha(self.alpha) {
            log::warn!("Failed to set overlay opacity: {}", e);
        }
        if let Err(e) = service.set_position(self.position) {
            log::warn!("Failed to position overlay: {}", e);
        }
        Self::exclude_from_capture(service);
        service.set_visible(false);
    }

    fn exclude_from_capture<W: WindowService + ?Sized>(service: &mut W) {
        if let Err(e) = service.set_capture_excluded(true) {
            log::warn!("Capture exclusion not applied: {}", e);
        }
    }

    /// Flips visibility. Showing raises the window to topmost and reasserts
    /// capture exclusion.
    pub fn toggle<W: WindowService + ?Sized>(&mut self, service: &mut W) -> Visibility {
        self.visibility = match self.visibility {
            Visibility::Visible => {
                service.set_visible(false);
                Visibility::Hidden
            }
            Visibility::Hidden => {
                if let Err(e) = service.set_position(self.position) {
                    log::warn!("Failed to restore overlay position: {}", e);
                }
                service.set_visible(true);
                if let Err(e) = service.raise_topmost() {
                    log::warn!("Failed to raise overlay: {}", e);
                }
                Self::exclude_from_capture(service);
                Visibility::Visible
            }
        };
        log::debug!("Overlay {:?} at ({}, {})", self.visibility, self.position.x, self.position.y);
        self.visibility
    }

    /// Moves the overlay one step. Does nothing while hidden.
    pub fn move_by<W: WindowService + ?Sized>(&mut self, service: &mut W, direction: Direction) {
        if self.visibility == Visibility::Hidden {
            return;
        }
        let (dx, dy) = direction.unit();
        self.position = self.position.offset(dx * self.step, dy * self.step);
        if let Err(e) = service.set_position(self.position) {
            log::warn!("Failed to move overlay: {}", e);
        }
    }

    /// Clears capture exclusion before the window goes away.
    pub fn shutdown<W: WindowService + ?Sized>(&mut self, service: &mut W) {
        if let Err(e) = service.set_capture_excluded(false) {
            log::debug!("Clearing capture exclusion failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeWindow;
    use proptest::prelude::*;

    fn controller() -> (OverlayController, FakeWindow) {
        let mut window = FakeWindow::default();
        let controller = OverlayController::new(&OverlayConfig::default());
        controller.setup(&mut window);
        (controller, window)
    }

    #[test]
    fn setup_applies_overlay_attributes() {
        let (controller, window) = controller();
        assert_eq!(controller.visibility(), Visibility::Hidden);
        assert!(window.ex_style.contains(ExStyle::OVERLAY));
        assert!(!window.ex_style.contains(ExStyle::TRANSPARENT));
        assert_eq!(window.alpha, 180);
        assert!(window.capture_excluded);
        assert!(!window.visible);
    }

    #[test]
    fn showing_reasserts_exclusion_and_raises() {
        let (mut controller, mut window) = controller();
        window.capture_excluded = false;
        controller.toggle(&mut window);
        assert!(window.visible);
        assert!(window.capture_excluded);
        assert_eq!(window.raise_count, 1);
    }

    #[test]
    fn exclusion_failure_does_not_block_toggle() {
        let (mut controller, mut window) = controller();
        window.fail_capture_exclusion = true;
        assert_eq!(controller.toggle(&mut window), Visibility::Visible);
        assert!(window.visible);
    }

    #[test]
    fn toggling_twice_restores_state_and_position() {
        let (mut controller, mut window) = controller();
        controller.toggle(&mut window);
        controller.move_by(&mut window, Direction::Right);
        let before = (controller.visibility(), controller.position());

        controller.toggle(&mut window);
        controller.toggle(&mut window);
        assert_eq!((controller.visibility(), controller.position()), before);
        assert_eq!(window.position, Point::new(150, 100));
    }

    #[test]
    fn shutdown_clears_exclusion() {
        let (mut controller, mut window) = controller();
        controller.shutdown(&mut window);
        assert!(!window.capture_excluded);
    }

    fn any_direction() -> impl Strategy<Value = Direction> {
        prop_oneof![
            Just(Direction::Up),
            Just(Direction::Down),
            Just(Direction::Left),
            Just(Direction::Right),
        ]
    }

    proptest! {
        #[test]
        fn prop_movement_changes_one_axis_by_one_step(
            moves in prop::collection::vec((any_direction(), any::<bool>()), 0..20),
        ) {
            let (mut controller, mut window) = controller();
            for (direction, toggle_first) in moves {
                if toggle_first {
                    controller.toggle(&mut window);
                }
                let before = controller.position();
                controller.move_by(&mut window, direction);
                let after = controller.position();
                let (dx, dy) = (after.x - before.x, after.y - before.y);

                if controller.visibility() == Visibility::Hidden {
                    prop_assert_eq!((dx, dy), (0, 0));
                } else {
                    let (ux, uy) = direction.unit();
                    prop_assert_eq!((dx, dy), (ux * 50, uy * 50));
                }
            }
        }
    }
}

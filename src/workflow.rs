//! Top-level editor flow: enter room dimensions, wait while the room is
//! built, then edit. Exiting returns to dimension entry.

use std::rc::Rc;
use std::time::{Duration, Instant};

use crate::context::SessionContext;
use crate::error::{EditorError, Result};
use crate::scene::room::{RoomDimensions, RoomShell};
use crate::scene::Scene;
use crate::session::EditorSession;

pub const DEFAULT_CONSTRUCT_DELAY: Duration = Duration::from_millis(1500);

/// Which screen the editor is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowState {
    DimensionEntry,
    Constructing,
    Editing,
}

enum Stage {
    DimensionEntry,
    Constructing { started: Instant, shell: RoomShell },
    Editing(Box<EditorSession>),
}

/// Result of [`Workflow::exit_workflow`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitOutcome {
    Exited,
    Stayed,
    Ignored,
}

pub struct Workflow {
    stage: Stage,
    /// Form values shown on the dimension screen. Survives an exit.
    pub draft: RoomDimensions,
    construct_delay: Duration,
    context: Rc<dyn SessionContext>,
}

impl Workflow {
    pub fn new(context: Rc<dyn SessionContext>, construct_delay: Duration) -> Self {
        Self {
            stage: Stage::DimensionEntry,
            draft: RoomDimensions::default(),
            construct_delay,
            context,
        }
    }

    pub fn state(&self) -> WorkflowState {
        match self.stage {
            Stage::DimensionEntry => WorkflowState::DimensionEntry,
            Stage::Constructing { .. } => WorkflowState::Constructing,
            Stage::Editing(_) => WorkflowState::Editing,
        }
    }

    pub fn context(&self) -> &Rc<dyn SessionContext> {
        &self.context
    }

    /// Replace the host predicates for the current and any later session.
    pub fn set_context(&mut self, context: Rc<dyn SessionContext>) {
        if let Stage::Editing(session) = &mut self.stage {
            session.set_context(context.clone());
        }
        self.context = context;
    }

    pub fn set_construct_delay(&mut self, delay: Duration) {
        self.construct_delay = delay;
    }

    /// Submit the dimension form. Only valid on the dimension screen.
    pub fn advance_workflow(&mut self, dimensions: RoomDimensions, now: Instant) -> Result<()> {
        if !matches!(self.stage, Stage::DimensionEntry) {
            log::warn!("advance_workflow ignored in {:?}", self.state());
            return Ok(());
        }
        dimensions.validate()?;
        self.draft = dimensions;
        self.stage = Stage::Constructing {
            started: now,
            shell: RoomShell::with_dimensions(dimensions),
        };
        log::info!(
            "constructing {}x{}x{} {} room",
            dimensions.width,
            dimensions.length,
            dimensions.height,
            dimensions.unit.label()
        );
        Ok(())
    }

    /// Finish construction once the delay has passed. Returns true on the transition.
    pub fn poll(&mut self, now: Instant) -> bool {
        let Stage::Constructing { started, shell } = &self.stage else {
            return false;
        };
        if now.saturating_duration_since(*started) < self.construct_delay {
            return false;
        }
        let session = EditorSession::new(shell.clone(), self.context.clone());
        self.stage = Stage::Editing(Box::new(session));
        log::info!("room ready, editing");
        true
    }

    /// Fraction of the construction delay elapsed, for the progress display.
    pub fn construction_progress(&self, now: Instant) -> f32 {
        match &self.stage {
            Stage::Constructing { started, .. } => {
                if self.construct_delay.is_zero() {
                    return 1.0;
                }
                let elapsed = now.saturating_duration_since(*started).as_secs_f32();
                (elapsed / self.construct_delay.as_secs_f32()).min(1.0)
            }
            Stage::Editing(_) => 1.0,
            Stage::DimensionEntry => 0.0,
        }
    }

    /// Whether leaving the editor would discard work and should be confirmed.
    pub fn request_exit(&self) -> bool {
        match &self.stage {
            Stage::Editing(session) => !session.scene().is_empty(),
            _ => false,
        }
    }

    pub fn exit_workflow(&mut self, confirmed: bool) -> ExitOutcome {
        let Stage::Editing(session) = &self.stage else {
            log::warn!("exit_workflow ignored in {:?}", self.state());
            return ExitOutcome::Ignored;
        };
        if !session.scene().is_empty() && !confirmed {
            return ExitOutcome::Stayed;
        }
        log::info!("leaving editor, {} items discarded", session.scene().len());
        self.stage = Stage::DimensionEntry;
        ExitOutcome::Exited
    }

    /// Jump straight into editing a loaded scene.
    pub fn open_scene(&mut self, scene: Scene) {
        self.draft = scene.room.dimensions;
        log::info!("opened scene with {} items", scene.len());
        self.stage = Stage::Editing(Box::new(EditorSession::from_scene(scene, self.context.clone())));
    }

    pub fn session(&self) -> Option<&EditorSession> {
        match &self.stage {
            Stage::Editing(session) => Some(&**session),
            _ => None,
        }
    }

    pub fn session_mut(&mut self) -> Option<&mut EditorSession> {
        match &mut self.stage {
            Stage::Editing(session) => Some(&mut **session),
            _ => None,
        }
    }

    /// The editing session, or `NotEditing` on the other screens.
    pub fn editing(&mut self) -> Result<&mut EditorSession> {
        self.session_mut().ok_or(EditorError::NotEditing)
    }

    /// Room being built while constructing.
    pub fn pending_shell(&self) -> Option<&RoomShell> {
        match &self.stage {
            Stage::Constructing { shell, .. } => Some(shell),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{LocalSession, Plan};
    use crate::scene::room::Unit;

    fn workflow() -> Workflow {
        Workflow::new(Rc::new(LocalSession::signed_in("t", Plan::Free)), DEFAULT_CONSTRUCT_DELAY)
    }

    fn editing(wf: &mut Workflow) -> Instant {
        let t0 = Instant::now();
        wf.advance_workflow(RoomDimensions::new(12.0, 12.0, 9.0, Unit::Feet), t0).unwrap();
        assert!(wf.poll(t0 + DEFAULT_CONSTRUCT_DELAY));
        t0
    }

    #[test]
    fn rejects_bad_dimensions() {
        let mut wf = workflow();
        let bad = RoomDimensions::new(12.0, 0.0, 9.0, Unit::Feet);
        assert_eq!(
            wf.advance_workflow(bad, Instant::now()),
            Err(EditorError::InvalidDimension { field: "length", value: 0.0 })
        );
        assert_eq!(wf.state(), WorkflowState::DimensionEntry);

        let nan = RoomDimensions::new(f32::NAN, 12.0, 9.0, Unit::Meters);
        assert!(wf.advance_workflow(nan, Instant::now()).is_err());
        assert_eq!(wf.state(), WorkflowState::DimensionEntry);
    }

    #[test]
    fn constructing_waits_for_delay() {
        let mut wf = workflow();
        let t0 = Instant::now();
        let dims = RoomDimensions::new(4.0, 5.0, 2.7, Unit::Meters);
        wf.advance_workflow(dims, t0).unwrap();
        assert_eq!(wf.state(), WorkflowState::Constructing);
        assert_eq!(wf.pending_shell().map(|s| s.dimensions), Some(dims));

        assert!(!wf.poll(t0 + Duration::from_millis(1000)));
        assert!((wf.construction_progress(t0 + Duration::from_millis(750)) - 0.5).abs() < 1e-3);
        assert!(wf.poll(t0 + Duration::from_millis(1500)));
        assert_eq!(wf.state(), WorkflowState::Editing);
        assert_eq!(wf.session().unwrap().scene().room.dimensions, dims);
        assert!(wf.session().unwrap().scene().is_empty());
    }

    #[test]
    fn advance_outside_entry_is_ignored() {
        let mut wf = workflow();
        let t0 = editing(&mut wf);
        let other = RoomDimensions::new(3.0, 3.0, 3.0, Unit::Meters);
        assert!(wf.advance_workflow(other, t0).is_ok());
        assert_eq!(wf.state(), WorkflowState::Editing);
        assert_eq!(wf.session().unwrap().scene().room.dimensions.width, 12.0);
    }

    #[test]
    fn empty_scene_exits_without_confirmation() {
        let mut wf = workflow();
        editing(&mut wf);
        assert!(!wf.request_exit());
        assert_eq!(wf.exit_workflow(false), ExitOutcome::Exited);
        assert_eq!(wf.state(), WorkflowState::DimensionEntry);
        assert_eq!(wf.draft.width, 12.0);
    }

    #[test]
    fn declined_exit_keeps_work() {
        let mut wf = workflow();
        editing(&mut wf);
        wf.editing().unwrap().add_instance("bed").unwrap();
        assert!(wf.request_exit());
        assert_eq!(wf.exit_workflow(false), ExitOutcome::Stayed);
        assert_eq!(wf.session().unwrap().scene().len(), 1);
    }

    #[test]
    fn confirmed_exit_discards_and_next_room_starts_fresh() {
        let mut wf = workflow();
        let t0 = editing(&mut wf);
        let s = wf.editing().unwrap();
        s.add_instance("sofa").unwrap();
        s.set_wall_color("left", "#bfdbfe").unwrap();
        assert_eq!(wf.exit_workflow(true), ExitOutcome::Exited);
        assert!(wf.session().is_none());

        let draft = wf.draft;
        wf.advance_workflow(draft, t0).unwrap();
        wf.poll(t0 + DEFAULT_CONSTRUCT_DELAY);
        let scene = wf.session().unwrap().scene();
        assert!(scene.is_empty());
        assert_eq!(scene.room, RoomShell::with_dimensions(draft));
    }

    #[test]
    fn scene_ops_need_editing() {
        let mut wf = workflow();
        assert!(matches!(wf.editing(), Err(EditorError::NotEditing)));
        assert_eq!(wf.exit_workflow(true), ExitOutcome::Ignored);
        assert!(!wf.poll(Instant::now()));
    }

    #[test]
    fn open_scene_skips_construction() {
        let mut wf = workflow();
        let mut scene = Scene::new(RoomShell::with_dimensions(RoomDimensions::new(5.0, 6.0, 3.0, Unit::Meters)));
        scene.push(crate::scene::FurnitureInstance::from_catalog(crate::scene::catalog::Archetype::Rug.info()));
        wf.open_scene(scene);
        assert_eq!(wf.state(), WorkflowState::Editing);
        assert_eq!(wf.draft.unit, Unit::Meters);
        assert!(wf.request_exit());
    }

    #[test]
    fn new_context_reaches_running_session() {
        let mut wf = workflow();
        editing(&mut wf);
        wf.set_context(Rc::new(LocalSession::anonymous()));
        assert!(!wf.context().is_authenticated());
        assert!(!wf.session().unwrap().context().is_authenticated());
    }
}

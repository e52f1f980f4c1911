//! Glue between the timer, the current scramble and the loaded session.
//!
//! The coordinator is headless: the shell feeds it key presses and releases and
//! calls [`Coordinator::poll`] on a fixed schedule to commit finished solves.

use std::path::PathBuf;

use chrono::Local;
use tracing::{debug, info, warn};

use crate::config::{Config, ConfigStore};
use crate::error::{CoordinatorError, StoreError};
use crate::scramble::{CubeSize, Scramble};
use crate::session::{write_backup, SessionData, SessionStore, Solve};
use crate::stats::PersonalBest;
use crate::timer::{Phase, Timer, TimerConfig};

/// Keys the timer cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKey {
    Space,
    Escape,
    Other,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CoordinatorEvent {
    /// `index` is 1-based, as shown in the solve list
    SolveSaved { index: usize, time: String },
    PersonalBest(PersonalBest),
    BackupWritten(PathBuf),
    StoreFailed(String),
}

/// Settings for a single run. They shape the timer and scrambles but are never
/// written back to the config file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Overrides {
    pub cube_size: Option<CubeSize>,
    pub enable_inspection: Option<bool>,
}

pub struct Coordinator<S: SessionStore, C: ConfigStore> {
    timer: Timer,
    scramble: Scramble,
    cube_size: CubeSize,
    session: Option<SessionData>,
    store: S,
    config_store: C,
    config: Config,
    just_stopped: bool,
    pending: Vec<CoordinatorEvent>,
}

impl<S: SessionStore, C: ConfigStore> Coordinator<S, C> {
    /// `config` is usually `config_store.load()`. It is saved back as is, so one-off
    /// settings belong in [`Coordinator::with_overrides`].
    pub fn new(store: S, config_store: C, config: Config, mut timer_config: TimerConfig) -> Self {
        timer_config.with_inspection = config.enable_inspection;
        let cube_size = config.cube_size;

        Self {
            timer: Timer::new(timer_config),
            scramble: Scramble::generate(cube_size),
            cube_size,
            session: None,
            store,
            config_store,
            config,
            just_stopped: false,
            pending: Vec::new(),
        }
    }

    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        if let Some(enabled) = overrides.enable_inspection {
            self.timer.set_inspection(enabled);
        }
        if let Some(cube_size) = overrides.cube_size {
            self.cube_size = cube_size;
            self.scramble = Scramble::generate(cube_size);
        }
        self
    }

    pub fn timer(&self) -> &Timer {
        &self.timer
    }

    pub fn phase(&self) -> Phase {
        self.timer.phase()
    }

    pub fn display(&self) -> String {
        self.timer.display()
    }

    pub fn scramble(&self) -> &Scramble {
        &self.scramble
    }

    pub fn cube_size(&self) -> CubeSize {
        self.cube_size
    }

    pub fn session(&self) -> Option<&SessionData> {
        self.session.as_ref()
    }

    /// Whether the next attempt starts with inspection, overrides included
    pub fn inspection_enabled(&self) -> bool {
        self.timer.with_inspection()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// A key went down. Any key stops a running solve.
    pub fn press(&mut self, key: TimerKey) {
        if key == TimerKey::Escape {
            self.cancel_attempt();
            return;
        }

        if self.timer.is_running() {
            self.timer.stop();
            self.just_stopped = true;
            debug!("timer stop");
        }
    }

    /// A key came up. Releasing space starts inspection or the solve, unless
    /// that same press just stopped the timer.
    pub fn release(&mut self, key: TimerKey) -> Result<(), CoordinatorError> {
        if key != TimerKey::Space {
            return Ok(());
        }
        if self.session.is_none() {
            return Err(CoordinatorError::NoSession);
        }

        if self.just_stopped {
            self.just_stopped = false;
        } else if !self.timer.is_running() {
            self.timer.start();
            debug!(phase = %self.timer.phase(), "timer start");
        }
        Ok(())
    }

    /// Press immediately followed by release, for terminals that never report releases.
    pub fn tap(&mut self, key: TimerKey) -> Result<(), CoordinatorError> {
        self.press(key);
        self.release(key)
    }

    /// Commit a finished solve if the timer has one waiting.
    pub fn poll(&mut self) -> Vec<CoordinatorEvent> {
        self.commit_ready();
        std::mem::take(&mut self.pending)
    }

    pub fn list_sessions(&self) -> Result<Vec<String>, CoordinatorError> {
        Ok(self.store.list()?)
    }

    pub fn new_session(&mut self, name: &str, overwrite: bool) -> Result<(), CoordinatorError> {
        self.settle();
        let session = self.store.create(name, self.cube_size, overwrite)?;
        self.switch_to(session)
    }

    pub fn open_session(&mut self, name: &str) -> Result<(), CoordinatorError> {
        self.settle();
        let session = self.store.load(name)?;
        self.cube_size = session.scramble_type();
        self.switch_to(session)
    }

    /// Open whichever session was in use last time, if any.
    pub fn load_last_session(&mut self) -> Result<Option<&SessionData>, CoordinatorError> {
        match self.config.last_session.clone() {
            Some(name) => {
                self.open_session(&name)?;
                Ok(self.session.as_ref())
            }
            None => Ok(None),
        }
    }

    pub fn rename_session(&mut self, name: &str) -> Result<(), CoordinatorError> {
        self.settle();
        let current = self.current_name()?;
        let renamed = self.store.rename(&current, name)?;
        self.session = Some(renamed);
        self.remember_last_session()
    }

    pub fn delete_session(&mut self) -> Result<(), CoordinatorError> {
        self.settle();
        let current = self.current_name()?;
        self.store.delete(&current)?;
        self.session = None;
        self.timer.reset_display();

        if self.config.last_session.as_deref() == Some(current.as_str()) {
            self.config.last_session = None;
            self.save_config()?;
        }
        Ok(())
    }

    pub fn remove_last_solve(&mut self) -> Result<Solve, CoordinatorError> {
        self.commit_ready();
        let len = self.session.as_ref().map(SessionData::len);
        match len {
            None => Err(CoordinatorError::NoSession),
            Some(0) => Err(CoordinatorError::NoSolves),
            Some(len) => self.remove_solve(len - 1),
        }
    }

    /// Remove the solve at 0-based `index` and persist the session.
    pub fn remove_solve(&mut self, index: usize) -> Result<Solve, CoordinatorError> {
        self.commit_ready();
        let session = self.session.as_ref().ok_or(CoordinatorError::NoSession)?;
        if session.is_empty() {
            return Err(CoordinatorError::NoSolves);
        }

        // only replace the loaded session once the file agrees
        let mut updated = session.clone();
        let removed = updated
            .remove(index)
            .ok_or(CoordinatorError::NoSuchSolve {
                index,
                len: session.len(),
            })?;
        self.store.save(&updated)?;
        self.session = Some(updated);

        info!(index, time = %removed.time, "removed solve");
        Ok(removed)
    }

    pub fn set_inspection(&mut self, enabled: bool) -> Result<(), CoordinatorError> {
        self.timer.set_inspection(enabled);
        self.config.enable_inspection = enabled;
        self.save_config()
    }

    /// Switch the puzzle. A loaded session follows along only while it has no solves.
    pub fn set_cube_size(&mut self, cube_size: CubeSize) -> Result<(), CoordinatorError> {
        // a waiting solve belongs to the old puzzle and scramble
        self.commit_ready();
        if let Some(session) = self.session.as_mut() {
            if session.scramble_type() != cube_size {
                if !session.is_empty() {
                    return Err(CoordinatorError::CubeSizeLocked {
                        name: session.name().to_string(),
                        cube_size: session.scramble_type(),
                    });
                }
                session.set_scramble_type(cube_size);
                self.store.save(session)?;
            }
        }

        self.cube_size = cube_size;
        self.config.cube_size = cube_size;
        self.new_scramble();
        self.save_config()
    }

    pub fn new_scramble(&mut self) -> &Scramble {
        self.commit_ready();
        self.scramble = Scramble::generate(self.cube_size);
        &self.scramble
    }

    /// Record the loaded session so the next start opens it again.
    pub fn remember_last_session(&mut self) -> Result<(), CoordinatorError> {
        let name = self.current_name()?;
        if self.config.last_session.as_deref() != Some(name.as_str()) {
            self.config.last_session = Some(name);
            self.save_config()?;
        }
        Ok(())
    }

    fn current_name(&self) -> Result<String, CoordinatorError> {
        self.session
            .as_ref()
            .map(|session| session.name().to_string())
            .ok_or(CoordinatorError::NoSession)
    }

    fn save_config(&self) -> Result<(), CoordinatorError> {
        self.config_store
            .save(&self.config)
            .map_err(|e| CoordinatorError::Store(StoreError::Io(e)))
    }

    fn cancel_attempt(&mut self) {
        if !self.timer.is_idle() {
            self.timer.cancel();
            info!("attempt cancelled");
        }
        self.timer.reset_display();
    }

    // Before the loaded session changes: keep a solve that is already waiting,
    // drop an attempt that is still in flight.
    fn settle(&mut self) {
        self.commit_ready();
        self.cancel_attempt();
        self.just_stopped = false;
    }

    fn switch_to(&mut self, session: SessionData) -> Result<(), CoordinatorError> {
        info!(session = session.name(), solves = session.len(), "session loaded");
        self.session = Some(session);
        self.new_scramble();
        self.remember_last_session()
    }

    fn commit_ready(&mut self) {
        let Some(finished) = self.timer.take_solve() else {
            return;
        };
        let Some(session) = self.session.as_mut() else {
            warn!(time = %finished.formatted, "solve finished without a session, dropping it");
            return;
        };

        let solve = match Solve::new(
            finished.formatted,
            self.scramble.to_string(),
            Local::now(),
        ) {
            Ok(solve) => solve,
            Err(e) => {
                warn!(error = %e, "finished time is unreadable, dropping it");
                return;
            }
        };

        let time = solve.time.clone();
        let bests = session.push(solve).new_bests.clone();
        let index = session.len();
        info!(index, %time, "saved solve");

        self.pending.push(CoordinatorEvent::SolveSaved { index, time });
        self.pending
            .extend(bests.into_iter().map(CoordinatorEvent::PersonalBest));

        if let Err(e) = self.store.save(session) {
            warn!(error = %e, "could not save session");
            self.pending.push(CoordinatorEvent::StoreFailed(e.to_string()));
        }

        if let Some(dir) = self.config.backup.due(session.len()) {
            match write_backup(session, dir) {
                Ok(path) => self.pending.push(CoordinatorEvent::BackupWritten(path)),
                Err(e) => {
                    warn!(error = %e, "could not write backup");
                    self.pending.push(CoordinatorEvent::StoreFailed(e.to_string()));
                }
            }
        }

        self.scramble = Scramble::generate(self.cube_size);
    }
}

//! Style Controller
//!
//! The single owner of the active state for one page lifetime. Every UI
//! action, the boot sequence and the reapplication loop reach the document
//! through [`StyleController::inject`]; nothing else writes the managed node.

use crate::config::EngineConfig;
use crate::dom::Page;
use crate::error::StyleError;
use crate::frames::{FramePropagator, PropagationReport};
use crate::history::{HistoryLedger, Navigation};
use crate::inject::StyleInjector;
use crate::presets::PresetRegistry;
use crate::reapply::{ReapplyLoop, Scheduler};
use crate::sanitize::sanitize;
use crate::sites::SiteBindings;
use crate::store::{PersistentStore, PresetMap, SiteBindingMap, StorageBackend};
use crate::transfer::ConfigDocument;
use crate::types::{StyleOverride, Theme};

/// In-memory projection of the persisted state for the current page.
/// Every change is written through to the store by the controller.
#[derive(Debug, Clone)]
pub struct ActiveState {
    pub current: Option<StyleOverride>,
    pub history: HistoryLedger,
    pub theme: Theme,
}

/// Result of a successful injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApplyOutcome {
    /// Whether a new history entry was recorded
    pub recorded: bool,
    pub frames: PropagationReport,
}

/// Result of an undo / redo step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryStep {
    Applied(ApplyOutcome),
    EarliestReached,
    LatestReached,
    Empty,
}

pub struct StyleController<P, B, S>
where
    P: Page,
    B: StorageBackend,
    S: Scheduler,
{
    config: EngineConfig,
    page: P,
    store: PersistentStore<B>,
    injector: StyleInjector,
    frames: FramePropagator,
    state: ActiveState,
    reapply: ReapplyLoop<S>,
}

impl<P, B, S> StyleController<P, B, S>
where
    P: Page,
    B: StorageBackend,
    S: Scheduler,
{
    /// Rehydrate the active state from `backend`. Nothing is injected until
    /// [`boot`](Self::boot).
    pub fn new(config: EngineConfig, page: P, backend: B, scheduler: S) -> Self {
        let config = config.normalized();
        let mut store = PersistentStore::new(backend);

        if let Err(e) = PresetRegistry::new(&mut store).list() {
            log::warn!("Failed to seed presets: {e}");
        }

        let state = ActiveState {
            current: None,
            history: HistoryLedger::from_entries(store.history(), config.max_history),
            theme: store.theme(),
        };
        let injector = StyleInjector::new(config.style_id.clone());
        let frames = FramePropagator::new(injector.clone());
        let reapply = ReapplyLoop::new(scheduler, config.reapply_debounce());

        Self {
            config,
            page,
            store,
            injector,
            frames,
            state,
            reapply,
        }
    }

    // =========================================================================
    // Boot
    // =========================================================================

    /// Resolve the override for this page and apply it.
    ///
    /// A binding for the page's domain wins over the global override. Returns
    /// `None` when the resolved CSS is empty.
    pub fn boot(&mut self) -> Result<Option<ApplyOutcome>, StyleError> {
        let hostname = self.page.hostname();
        let bound = SiteBindings::new(&mut self.store).resolve(&hostname);
        let resolved = match bound {
            Some(style) => style,
            None => StyleOverride::new(self.store.current_css(), self.store.selector()),
        };

        if resolved.is_empty() {
            log::debug!("Nothing to apply on '{hostname}'");
            return Ok(None);
        }

        log::info!("Applying saved style on '{hostname}'");
        self.inject(&resolved.css, &resolved.selector).map(Some)
    }

    // =========================================================================
    // Injection
    // =========================================================================

    /// Sanitize `css`, write it into the main document and same-origin
    /// frames, then persist and record it.
    ///
    /// A DOM failure in the main document leaves the active state and the
    /// store untouched.
    pub fn inject(&mut self, css: &str, selector: &str) -> Result<ApplyOutcome, StyleError> {
        let selector = if selector.trim().is_empty() {
            self.config.default_selector.as_str()
        } else {
            selector
        };
        let style = StyleOverride::new(sanitize(css), selector);

        if let Err(e) = self.injector.apply(&self.page.document(), &style) {
            log::error!("Failed to apply CSS: {e}");
            return Err(StyleError::Injection(e));
        }

        let frames = self.frames.propagate(&self.page, &style);

        let recorded = self
            .state
            .history
            .record(style.clone(), self.page.now_millis());
        self.state.current = Some(style.clone());

        self.store.set_current_css(&style.css)?;
        self.store.set_selector(&style.selector)?;
        SiteBindings::new(&mut self.store).bind(&self.page.hostname(), &style)?;
        if recorded {
            self.store.set_history(&self.state.history.to_vec())?;
        }

        Ok(ApplyOutcome { recorded, frames })
    }

    /// Whether the browser accepts `css`.
    pub fn validate(&self, css: &str) -> Result<(), StyleError> {
        self.injector
            .validate(&self.page.document(), css)
            .map_err(StyleError::Validation)
    }

    /// Validate and apply, as the editor's preview button does.
    pub fn preview_once(&mut self, css: &str, selector: &str) -> Result<ApplyOutcome, StyleError> {
        self.validate(css)?;
        self.inject(css, selector)
    }

    /// Validate, apply, persist and record.
    pub fn save_and_commit(&mut self, css: &str, selector: &str) -> Result<ApplyOutcome, StyleError> {
        self.validate(css)?;
        self.inject(css, selector)
    }

    /// Remove the managed node everywhere and clear the current CSS.
    /// History, presets and site bindings are kept.
    pub fn reset_all(&mut self) -> Result<(), StyleError> {
        self.reapply.cancel();
        self.injector.clear(&self.page.document())?;
        self.frames.clear(&self.page);
        self.state.current = None;
        self.store.set_current_css("")?;
        Ok(())
    }

    // =========================================================================
    // History
    // =========================================================================

    pub fn undo(&mut self) -> Result<HistoryStep, StyleError> {
        self.step(-1)
    }

    pub fn redo(&mut self) -> Result<HistoryStep, StyleError> {
        self.step(1)
    }

    fn step(&mut self, direction: i8) -> Result<HistoryStep, StyleError> {
        let cursor = self.state.history.cursor();
        match self.state.history.navigate(direction) {
            Navigation::Moved(style) => self
                .reinject(&style, cursor)
                .map(HistoryStep::Applied),
            Navigation::EarliestReached => Ok(HistoryStep::EarliestReached),
            Navigation::LatestReached => Ok(HistoryStep::LatestReached),
            Navigation::Empty => Ok(HistoryStep::Empty),
        }
    }

    /// Re-apply the history entry at `index`. `None` when out of range.
    pub fn jump_to_history(&mut self, index: usize) -> Result<Option<ApplyOutcome>, StyleError> {
        let cursor = self.state.history.cursor();
        match self.state.history.jump_to(index) {
            Some(style) => self.reinject(&style, cursor).map(Some),
            None => Ok(None),
        }
    }

    /// Inject a history entry, putting the cursor back to `cursor` when the
    /// document rejects it.
    fn reinject(
        &mut self,
        style: &StyleOverride,
        cursor: Option<usize>,
    ) -> Result<ApplyOutcome, StyleError> {
        let outcome = self.inject(&style.css, &style.selector);
        if let Err(StyleError::Injection(_)) = outcome {
            self.state.history.restore_cursor(cursor);
        }
        outcome
    }

    pub fn clear_history(&mut self) -> Result<(), StyleError> {
        self.state.history.clear();
        self.store.set_history(&[])?;
        Ok(())
    }

    pub fn history(&self) -> &HistoryLedger {
        &self.state.history
    }

    // =========================================================================
    // Presets
    // =========================================================================

    pub fn presets(&mut self) -> Result<PresetMap, StyleError> {
        PresetRegistry::new(&mut self.store).list()
    }

    pub fn save_preset(&mut self, name: &str, css: &str) -> Result<(), StyleError> {
        PresetRegistry::new(&mut self.store).save(name, css)
    }

    pub fn edit_preset(&mut self, name: &str, css: &str) -> Result<(), StyleError> {
        PresetRegistry::new(&mut self.store).edit(name, css)
    }

    pub fn delete_preset(&mut self, name: &str) -> Result<(), StyleError> {
        PresetRegistry::new(&mut self.store).delete(name)
    }

    /// Apply the preset called `name` as a committed edit.
    pub fn apply_preset(&mut self, name: &str, selector: &str) -> Result<ApplyOutcome, StyleError> {
        let css = PresetRegistry::new(&mut self.store).get(name)?;
        self.save_and_commit(&css, selector)
    }

    // =========================================================================
    // Site Bindings
    // =========================================================================

    pub fn site_bindings(&mut self) -> SiteBindingMap {
        SiteBindings::new(&mut self.store).list()
    }

    /// Remove the binding for `domain`. Returns whether one existed.
    pub fn unbind_site(&mut self, domain: &str) -> Result<bool, StyleError> {
        Ok(SiteBindings::new(&mut self.store).unbind(domain)?)
    }

    /// Drop every site binding, used when per-site configuration is disabled.
    pub fn unbind_all_sites(&mut self) -> Result<(), StyleError> {
        Ok(SiteBindings::new(&mut self.store).unbind_all()?)
    }

    // =========================================================================
    // Theme
    // =========================================================================

    pub fn theme(&self) -> Theme {
        self.state.theme
    }

    pub fn set_theme(&mut self, theme: Theme) -> Result<(), StyleError> {
        self.store.set_theme(theme)?;
        self.state.theme = theme;
        Ok(())
    }

    pub fn toggle_theme(&mut self) -> Result<Theme, StyleError> {
        let theme = self.state.theme.toggled();
        self.set_theme(theme)?;
        Ok(theme)
    }

    // =========================================================================
    // Export / Import
    // =========================================================================

    pub fn export_config(&self) -> String {
        ConfigDocument::capture(&self.store).to_json()
    }

    /// Upsert the keys present in `text`. A malformed payload writes nothing.
    ///
    /// The history ledger and theme are rehydrated afterwards; the document
    /// keeps its current style until the host reloads.
    pub fn import_config(&mut self, text: &str) -> Result<Vec<&'static str>, StyleError> {
        let document = ConfigDocument::parse(text).map_err(|e| {
            log::error!("Config import failed: {e}");
            e
        })?;
        let written = document.apply_to(&mut self.store)?;

        self.state.history = HistoryLedger::from_entries(self.store.history(), self.config.max_history);
        self.state.theme = self.store.theme();
        log::info!("Imported {} config keys", written.len());
        Ok(written)
    }

    // =========================================================================
    // Reapplication
    // =========================================================================

    /// A child-list mutation was observed under the page body.
    pub fn handle_mutation(&mut self) {
        self.reapply.on_mutation();
    }

    /// The debounce timer identified by `token` expired. Re-injects the
    /// current override when the timer is live and there is one.
    pub fn handle_reapply_timer(&mut self, token: u64) -> Result<Option<ApplyOutcome>, StyleError> {
        if !self.reapply.on_timer(token) {
            return Ok(None);
        }

        let Some(style) = self.state.current.clone().filter(|s| !s.is_empty()) else {
            return Ok(None);
        };
        self.inject(&style.css, &style.selector).map(Some)
    }

    pub fn is_reapply_pending(&self) -> bool {
        self.reapply.is_pending()
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn current(&self) -> Option<&StyleOverride> {
        self.state.current.as_ref()
    }

    pub fn state(&self) -> &ActiveState {
        &self.state
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn page(&self) -> &P {
        &self.page
    }

    pub fn store(&self) -> &PersistentStore<B> {
        &self.store
    }
}

use std::sync::mpsc;

use crate::auth::{IdentityProvider, LocalIdentity};
use crate::config::Config;
use crate::corpus::{Corpus, FREQUENCY_BANDS, Item, Tier};
use crate::engine::classifier::{Intent, LearningSets};
use crate::engine::pool::{self, FilterCriteria};
use crate::engine::scoring::{self, ScoreState};
use crate::event::AppEvent;
use crate::session::SessionState;
use crate::store::json_store::JsonStore;
use crate::store::sync::{StatsSnapshot, SyncHandle, SyncTask, load_learning_state};
use crate::store::RecordStore;
use crate::ui::components::menu::Menu;
use crate::ui::theme::Theme;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppScreen {
    Menu,
    Practice,
    Summary,
    Filters,
    SignIn,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PracticeMode {
    /// Type the word from its English gloss; mastered words are skipped and
    /// outcomes feed the learning sets.
    Recall,
    /// Type the word shown on screen; no learning bookkeeping.
    Copy,
}

impl PracticeMode {
    pub fn as_str(self) -> &'static str {
        match self {
            PracticeMode::Recall => "recall",
            PracticeMode::Copy => "copy",
        }
    }

    /// Copy practice is unranked: attempts neither feed the learning sets
    /// nor sync stats, so copy-mode score changes stay local until the next
    /// recall submission or identity reload.
    pub fn is_ranked(self) -> bool {
        matches!(self, PracticeMode::Recall)
    }
}

pub struct App {
    pub screen: AppScreen,
    pub mode: PracticeMode,
    pub menu: Menu<'static>,
    pub theme: &'static Theme,
    pub config: Config,
    pub corpus: Corpus,
    pub criteria: FilterCriteria,
    pub pool: Vec<Item>,
    pub session: SessionState,
    pub score: ScoreState,
    pub sets: LearningSets,
    pub current: Option<Item>,
    pub identity: Box<dyn IdentityProvider>,
    pub notice: Option<String>,
    pub should_quit: bool,
    pub filters_selected: usize,
    pub sign_in_input: String,
    sync: Option<SyncHandle>,
    // Separate store instance for load-time reads; the sync worker owns its
    // own handle.
    read_store: Option<Box<dyn RecordStore>>,
}

fn build_store(config: &Config) -> Result<Box<dyn RecordStore>, crate::store::StoreError> {
    #[cfg(feature = "network")]
    if config.backend == "rest" && !config.rest_url.is_empty() {
        let store = crate::store::rest::RestStore::new(&config.rest_url, &config.rest_api_key)?;
        return Ok(Box::new(store));
    }
    let _ = config;
    Ok(Box::new(JsonStore::new()?))
}

fn criteria_from_config(config: &Config) -> FilterCriteria {
    FilterCriteria {
        classification: (config.classification != "all").then(|| config.classification.clone()),
        complexity: match config.complexity.as_str() {
            "A" => Some(Tier::A),
            "B" => Some(Tier::B),
            "C" => Some(Tier::C),
            _ => None,
        },
        frequency_band: config.frequency_band.parse::<usize>().ok(),
    }
}

impl App {
    pub fn new(events: mpsc::Sender<AppEvent>) -> Self {
        let config = Config::load().unwrap_or_default();
        let loaded_theme = Theme::load(&config.theme).unwrap_or_default();
        let theme: &'static Theme = Box::leak(Box::new(loaded_theme));
        let menu = Menu::new(theme);

        let corpus = Corpus::load();
        let criteria = criteria_from_config(&config);

        let mut notice = None;
        let sync = match build_store(&config) {
            Ok(store) => Some(SyncHandle::spawn(store, events.clone())),
            Err(err) => {
                notice = Some(format!("store unavailable: {err}"));
                None
            }
        };
        let read_store = build_store(&config).ok();

        let identity: Box<dyn IdentityProvider> = match LocalIdentity::new(events) {
            Ok(identity) => Box::new(identity),
            Err(err) => {
                notice = Some(format!("identity unavailable: {err}"));
                Box::new(AnonymousIdentity)
            }
        };

        let mode = if config.mode == "copy" {
            PracticeMode::Copy
        } else {
            PracticeMode::Recall
        };

        let mut app = Self {
            screen: AppScreen::Menu,
            mode,
            menu,
            theme,
            config,
            corpus,
            criteria,
            pool: Vec::new(),
            session: SessionState::new(),
            score: ScoreState::default(),
            sets: LearningSets::default(),
            current: None,
            identity,
            notice,
            should_quit: false,
            filters_selected: 0,
            sign_in_input: String::new(),
            sync,
            read_store,
        };
        app.rebuild_pool();
        if let Some(user) = app.identity.current_user() {
            app.reload_learning(Some(user.as_str()));
        }
        app
    }

    pub fn set_theme(&mut self, theme: &'static Theme) {
        self.theme = theme;
        self.menu.theme = theme;
    }

    pub fn level(&self) -> Option<u32> {
        pool::level_for(&self.criteria, self.pool.len())
    }

    /// Recompute the pool from the active criteria. Resets the cursor and
    /// input; the learning sets are untouched.
    pub fn rebuild_pool(&mut self) {
        self.pool = pool::filtered_pool(self.corpus.items(), &self.criteria);
        self.session.reset_for_new_pool();
        self.load_current();
    }

    /// Resolve the cursor to the next presentable item. `current` becoming
    /// `None` means the pool is exhausted for this mode, which the practice
    /// screen reports as a completion state.
    pub fn load_current(&mut self) {
        let skip_mastered = self.mode == PracticeMode::Recall;
        match pool::next_valid(
            self.session.cursor,
            &self.pool,
            &self.sets.mastered,
            skip_mastered,
        ) {
            Some((pos, item)) => {
                let item = item.clone();
                self.session.cursor = pos;
                self.session.load_target(&item.hangul);
                self.current = Some(item);
            }
            None => {
                self.current = None;
                self.session.clear_attempt();
            }
        }
    }

    pub fn start_practice(&mut self, mode: PracticeMode) {
        self.mode = mode;
        self.session.reset_for_new_pool();
        self.load_current();
        self.screen = AppScreen::Practice;
    }

    pub fn go_to_menu(&mut self) {
        self.screen = AppScreen::Menu;
    }

    /// Leave practice via the session summary. Anything typed so far this
    /// attempt is discarded; the score carries across sessions.
    pub fn end_practice(&mut self) {
        self.session.clear_attempt();
        self.screen = AppScreen::Summary;
    }

    pub fn type_char(&mut self, ch: char) {
        if self.current.is_some() {
            self.session.push_char(ch);
        }
    }

    pub fn backspace(&mut self) {
        self.session.backspace();
    }

    /// Score the attempt, classify it, and hand persistence intents to the
    /// sync worker. Empty submissions are ignored.
    pub fn submit(&mut self) {
        let Some(item) = self.current.clone() else {
            return;
        };
        if self.session.input.is_empty() {
            return;
        }

        let correct = self.session.attempt_correct();
        let level = self.level();
        scoring::apply_submission(&mut self.score, correct, level);

        let user = self.identity.current_user();
        if self.mode.is_ranked()
            && let Some(user) = user
        {
            if let Some(intent) = self.sets.classify(&item, correct)
                && let Some(ref sync) = self.sync
            {
                sync.enqueue(match intent {
                    Intent::MarkMastered { item } => SyncTask::MarkMastered {
                        user: user.clone(),
                        item,
                    },
                    Intent::RecordMiss { item } => SyncTask::RecordMiss {
                        user: user.clone(),
                        item,
                    },
                });
            }
            if let Some(ref sync) = self.sync {
                sync.enqueue(SyncTask::PushStats {
                    user,
                    snapshot: StatsSnapshot::from_score_state(&self.score),
                });
            }
        }

        self.session.cursor += 1;
        self.session.clear_attempt();
        self.load_current();
    }

    pub fn cycle_classification(&mut self, forward: bool) {
        let tags = self.corpus.classifications();
        // Options: "all" followed by every corpus tag.
        let mut options: Vec<Option<String>> = vec![None];
        options.extend(tags.into_iter().map(Some));
        let pos = options
            .iter()
            .position(|o| *o == self.criteria.classification)
            .unwrap_or(0);
        let next = cycle_index(pos, options.len(), forward);
        self.criteria.classification = options[next].clone();
        self.rebuild_pool();
    }

    pub fn cycle_complexity(&mut self, forward: bool) {
        let options: Vec<Option<Tier>> =
            std::iter::once(None).chain(Tier::ALL.map(Some)).collect();
        let pos = options
            .iter()
            .position(|o| *o == self.criteria.complexity)
            .unwrap_or(0);
        let next = cycle_index(pos, options.len(), forward);
        self.criteria.complexity = options[next];
        self.rebuild_pool();
    }

    pub fn cycle_frequency_band(&mut self, forward: bool) {
        let options: Vec<Option<usize>> = std::iter::once(None)
            .chain((0..FREQUENCY_BANDS).map(Some))
            .collect();
        let pos = options
            .iter()
            .position(|o| *o == self.criteria.frequency_band)
            .unwrap_or(0);
        let next = cycle_index(pos, options.len(), forward);
        self.criteria.frequency_band = options[next];
        self.rebuild_pool();
    }

    pub fn sign_in(&mut self) {
        let name = self.sign_in_input.trim().to_string();
        self.sign_in_input.clear();
        if let Err(err) = self.identity.sign_in(&name) {
            self.notice = Some(format!("sign-in failed: {err}"));
            return;
        }
        self.screen = AppScreen::Menu;
    }

    pub fn sign_out(&mut self) {
        if let Err(err) = self.identity.sign_out() {
            self.notice = Some(format!("sign-out failed: {err}"));
        }
    }

    /// Identity switches swap the whole learning context: sets and score
    /// are replaced by the new user's remote state (or cleared when signed
    /// out), while the pool and filters stay as they are.
    pub fn on_identity_changed(&mut self, user: Option<String>) {
        self.reload_learning(user.as_deref());
        self.load_current();
    }

    fn reload_learning(&mut self, user: Option<&str>) {
        let Some(user) = user else {
            self.sets = LearningSets::default();
            self.score = ScoreState::default();
            return;
        };
        let Some(ref store) = self.read_store else {
            self.sets = LearningSets::default();
            self.score = ScoreState::default();
            return;
        };
        match load_learning_state(store.as_ref(), user) {
            Ok(loaded) => {
                self.sets = loaded.sets;
                self.score = loaded.score;
                if !loaded.duplicate_items.is_empty() {
                    self.notice = Some(format!(
                        "merged duplicate review records: {}",
                        loaded.duplicate_items.join(", ")
                    ));
                }
            }
            Err(err) => {
                self.notice = Some(format!("load failed: {err}"));
                self.sets = LearningSets::default();
                self.score = ScoreState::default();
            }
        }
    }

    /// Mirror the active criteria back into the config so filter choices
    /// persist across runs.
    pub fn sync_config_from_criteria(&mut self) {
        self.config.classification = self
            .criteria
            .classification
            .clone()
            .unwrap_or_else(|| "all".to_string());
        self.config.complexity = self
            .criteria
            .complexity
            .map(|t| t.label().to_string())
            .unwrap_or_else(|| "all".to_string());
        self.config.frequency_band = self
            .criteria
            .frequency_band
            .map(|b| b.to_string())
            .unwrap_or_else(|| "all".to_string());
        self.config.mode = self.mode.as_str().to_string();
    }

    pub fn on_sync_notice(&mut self, message: String) {
        self.notice = Some(message);
    }

    /// Flush pending writes before the terminal is restored.
    pub fn shutdown(&mut self) {
        if let Some(sync) = self.sync.take() {
            sync.shutdown();
        }
    }
}

fn cycle_index(pos: usize, len: usize, forward: bool) -> usize {
    if forward {
        (pos + 1) % len
    } else {
        (pos + len - 1) % len
    }
}

/// Fallback when the identity file cannot be managed; keeps the app usable
/// without record attribution.
struct AnonymousIdentity;

impl IdentityProvider for AnonymousIdentity {
    fn current_user(&self) -> Option<String> {
        None
    }

    fn sign_in(&mut self, _user: &str) -> anyhow::Result<()> {
        anyhow::bail!("identity storage is unavailable")
    }

    fn sign_out(&mut self) -> anyhow::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_index_wraps_both_ways() {
        assert_eq!(cycle_index(0, 3, true), 1);
        assert_eq!(cycle_index(2, 3, true), 0);
        assert_eq!(cycle_index(0, 3, false), 2);
        assert_eq!(cycle_index(1, 3, false), 0);
    }

    #[test]
    fn criteria_from_config_parses_dimensions() {
        let mut config = Config::default();
        config.classification = "noun".to_string();
        config.complexity = "B".to_string();
        config.frequency_band = "2".to_string();
        let criteria = criteria_from_config(&config);
        assert_eq!(criteria.classification.as_deref(), Some("noun"));
        assert_eq!(criteria.complexity, Some(Tier::B));
        assert_eq!(criteria.frequency_band, Some(2));

        let all = criteria_from_config(&Config::default());
        assert_eq!(all, FilterCriteria::default());
    }
}

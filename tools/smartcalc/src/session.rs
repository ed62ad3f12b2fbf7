//! One calculator session bound to its state file

use anyhow::{bail, Context, Result};
use common::{AiSettings, SmartCalcConfig};
use smartcalc_core::{
    AiQueryCoordinator, AiQueryState, CalcEngine, Calculator, GeminiConfig, GeminiSolver,
    JsonFileStore, ModeKind, PersistedSettings, SharedCalculator, SubmitOutcome,
};
use std::time::Duration;
use tracing::info;

pub type Coordinator = AiQueryCoordinator<CalcEngine, GeminiSolver>;

pub struct Session {
    calc: SharedCalculator<CalcEngine>,
    store: JsonFileStore,
    ai: AiSettings,
    saved: PersistedSettings,
}

impl Session {
    pub async fn open(config: &SmartCalcConfig) -> Result<Self> {
        let store = JsonFileStore::open(&config.state_file)
            .await
            .with_context(|| {
                format!("Failed to open state file {}", config.state_file.display())
            })?;
        let saved = PersistedSettings::load(&store)
            .await
            .context("Failed to load saved settings")?;
        let engine = CalcEngine::new().context("Failed to initialize expression engine")?;
        let calc = Calculator::with_settings(engine, saved.clone()).into_shared();

        info!(
            state_file = %config.state_file.display(),
            history = saved.history.len(),
            "session opened"
        );
        Ok(Self {
            calc,
            store,
            ai: config.ai.clone(),
            saved,
        })
    }

    pub fn calc(&self) -> &SharedCalculator<CalcEngine> {
        &self.calc
    }

    /// Write theme, limit and history if they changed since the last save
    pub async fn persist(&mut self) -> Result<()> {
        let snapshot = self.calc.lock().snapshot();
        if snapshot == self.saved {
            return Ok(());
        }
        snapshot
            .save(&self.store)
            .await
            .with_context(|| format!("Failed to save {}", self.store.path().display()))?;
        self.saved = snapshot;
        Ok(())
    }

    /// AI coordinator sharing this session's calculator
    pub fn coordinator(&self) -> Result<Coordinator> {
        let solver = GeminiSolver::new(GeminiConfig {
            api_key: self.ai.api_key.clone(),
            model: self.ai.model.clone(),
            endpoint: self.ai.endpoint.clone(),
            timeout: Duration::from_secs(self.ai.timeout_secs),
        })
        .context("Failed to create AI client")?;
        Ok(AiQueryCoordinator::new(self.calc.clone(), solver))
    }

    /// Submit one AI query and wait for its outcome
    ///
    /// In AI mode the query also becomes the input buffer.
    pub async fn ask(&self, coordinator: &Coordinator, query: &str) -> Result<AiQueryState> {
        {
            let mut calc = self.calc.lock();
            if calc.mode_kind() == ModeKind::Ai {
                calc.set_ai_input(query);
            }
        }
        match coordinator.submit(query).await {
            SubmitOutcome::Completed(state) => Ok(state),
            SubmitOutcome::Rejected => {
                bail!("Query rejected: it is empty or another query is still pending")
            },
        }
    }
}

//! Business logic services

pub mod bestsellers;
pub mod clock;
pub mod loans;
pub mod policy;

use std::sync::Arc;

use crate::{config::AppConfig, error::AppResult, repository::Repository};

use self::{
    bestsellers::{HttpRankProvider, RankProvider},
    clock::{Clock, SystemClock},
    policy::LoanPolicy,
};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub loans: loans::LoansService,
    repository: Repository,
}

impl Services {
    /// Create all services with explicit clock and rank provider
    pub fn new(
        repository: Repository,
        clock: Arc<dyn Clock>,
        ranks: Arc<dyn RankProvider>,
        policy: LoanPolicy,
    ) -> Self {
        Self {
            loans: loans::LoansService::new(repository.clone(), clock, ranks, policy),
            repository,
        }
    }

    /// Create all services backed by the system clock and the configured
    /// bestsellers service
    pub fn from_config(repository: Repository, config: &AppConfig) -> AppResult<Self> {
        let ranks = HttpRankProvider::new(&config.bestsellers)?;
        Ok(Self::new(
            repository,
            Arc::new(SystemClock),
            Arc::new(ranks),
            LoanPolicy::new(config.policy),
        ))
    }

    /// Check that the database answers
    pub async fn ready(&self) -> AppResult<()> {
        self.repository.ping().await
    }
}

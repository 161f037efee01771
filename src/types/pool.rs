//! Lending Pool Types
//!
//! Types for tracking a tokenized lending pool through its deployment
//! lifecycle:
//! pending → approved → deploying_pool → pool_created → configuring_pool
//! → pool_configured → deploying_loans → deployed

use serde::{Deserialize, Serialize};

use super::units;

/// Status of a pool through its deployment lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolStatus {
    /// Created, awaiting admin approval
    Pending,
    /// Approved, pool-creation transaction about to be submitted
    Approved,
    /// Pool-creation transaction submitted, awaiting confirmation
    DeployingPool,
    /// Pool exists on-chain
    PoolCreated,
    /// Configuration transaction submitted, awaiting confirmation
    ConfiguringPool,
    /// Pool configured on-chain
    PoolConfigured,
    /// Batch loan-deployment transaction submitted, awaiting confirmation
    DeployingLoans,
    /// All loans deployed (terminal)
    Deployed,
    /// Rejected by an admin (terminal, only from pending)
    Rejected,
    /// A deployment step failed on-chain; retriable by an operator
    Failed,
}

impl Default for PoolStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl std::fmt::Display for PoolStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Approved => write!(f, "approved"),
            Self::DeployingPool => write!(f, "deploying_pool"),
            Self::PoolCreated => write!(f, "pool_created"),
            Self::ConfiguringPool => write!(f, "configuring_pool"),
            Self::PoolConfigured => write!(f, "pool_configured"),
            Self::DeployingLoans => write!(f, "deploying_loans"),
            Self::Deployed => write!(f, "deployed"),
            Self::Rejected => write!(f, "rejected"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl PoolStatus {
    /// Whether no further transition is possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Deployed | Self::Rejected)
    }

    /// Position along the happy-path pipeline; `None` for rejected/failed
    pub fn pipeline_rank(&self) -> Option<u8> {
        match self {
            Self::Pending => Some(0),
            Self::Approved => Some(1),
            Self::DeployingPool => Some(2),
            Self::PoolCreated => Some(3),
            Self::ConfiguringPool => Some(4),
            Self::PoolConfigured => Some(5),
            Self::DeployingLoans => Some(6),
            Self::Deployed => Some(7),
            Self::Rejected | Self::Failed => None,
        }
    }

    /// Whether a deployment transaction is currently awaiting confirmation
    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            Self::DeployingPool | Self::ConfiguringPool | Self::DeployingLoans
        )
    }
}

impl std::str::FromStr for PoolStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "deploying_pool" => Ok(Self::DeployingPool),
            "pool_created" => Ok(Self::PoolCreated),
            "configuring_pool" => Ok(Self::ConfiguringPool),
            "pool_configured" => Ok(Self::PoolConfigured),
            "deploying_loans" => Ok(Self::DeployingLoans),
            "deployed" => Ok(Self::Deployed),
            "rejected" => Ok(Self::Rejected),
            "failed" => Ok(Self::Failed),
            other => Err(format!("unknown pool status: {}", other)),
        }
    }
}

/// One of the three on-chain deployment steps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeployStep {
    CreatePool,
    ConfigurePool,
    DeployLoans,
}

impl DeployStep {
    /// Status entered once this step's transaction has been submitted
    pub fn in_flight_status(&self) -> PoolStatus {
        match self {
            Self::CreatePool => PoolStatus::DeployingPool,
            Self::ConfigurePool => PoolStatus::ConfiguringPool,
            Self::DeployLoans => PoolStatus::DeployingLoans,
        }
    }

    /// Status reached when this step's transaction confirms
    pub fn target_status(&self) -> PoolStatus {
        match self {
            Self::CreatePool => PoolStatus::PoolCreated,
            Self::ConfigurePool => PoolStatus::PoolConfigured,
            Self::DeployLoans => PoolStatus::Deployed,
        }
    }

    /// Status from which this step is normally submitted
    pub fn prior_status(&self) -> PoolStatus {
        match self {
            Self::CreatePool => PoolStatus::Approved,
            Self::ConfigurePool => PoolStatus::PoolCreated,
            Self::DeployLoans => PoolStatus::PoolConfigured,
        }
    }

    /// Step that follows this one, if any
    pub fn next(&self) -> Option<DeployStep> {
        match self {
            Self::CreatePool => Some(Self::ConfigurePool),
            Self::ConfigurePool => Some(Self::DeployLoans),
            Self::DeployLoans => None,
        }
    }
}

impl std::fmt::Display for DeployStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CreatePool => write!(f, "create_pool"),
            Self::ConfigurePool => write!(f, "configure_pool"),
            Self::DeployLoans => write!(f, "deploy_loans"),
        }
    }
}

impl std::str::FromStr for DeployStep {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create_pool" => Ok(Self::CreatePool),
            "configure_pool" => Ok(Self::ConfigurePool),
            "deploy_loans" => Ok(Self::DeployLoans),
            other => Err(format!("unknown deployment step: {}", other)),
        }
    }
}

/// A loan included in a pool at creation time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanInput {
    /// Principal as a decimal string (6 fractional digits max)
    pub principal: String,
    /// Annual interest rate in percent (e.g. 8.25)
    pub interest_rate_percent: f64,
    /// Term in months
    pub term_months: u32,
}

/// Loan aggregates computed once at pool creation, immutable thereafter
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct LoanAggregates {
    /// Sum of principals in micro-units (6 decimals)
    pub total_principal: u64,
    /// Number of loans in the batch
    pub loan_count: u32,
    /// Average interest rate scaled to 18 decimals
    pub avg_interest_rate_wad: u128,
    /// Average term in months, rounded to nearest
    pub avg_term_months: u32,
}

impl LoanAggregates {
    /// Compute aggregates from the loan batch. `None` if the batch is
    /// empty or any loan has an unparseable principal or invalid rate.
    pub fn from_loans(loans: &[LoanInput]) -> Option<Self> {
        if loans.is_empty() {
            return None;
        }

        let mut total_principal: u64 = 0;
        let mut rate_sum_wad: u128 = 0;
        let mut term_sum: u64 = 0;

        for loan in loans {
            let principal = units::parse_units6(&loan.principal)?;
            total_principal = total_principal.checked_add(principal)?;
            rate_sum_wad =
                rate_sum_wad.checked_add(units::percent_to_wad(loan.interest_rate_percent)?)?;
            term_sum += loan.term_months as u64;
        }

        let n = loans.len() as u64;
        Some(Self {
            total_principal,
            loan_count: loans.len() as u32,
            avg_interest_rate_wad: rate_sum_wad / n as u128,
            avg_term_months: ((term_sum + n / 2) / n) as u32,
        })
    }
}

/// A pool record tracking one lending pool through its lifecycle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolRecord {
    /// Unique pool ID
    pub id: String,
    /// Current status
    pub status: PoolStatus,
    /// Loan aggregates, fixed at creation
    pub aggregates: LoanAggregates,

    /// Creator identity
    pub created_by: String,
    /// Approver identity, set on approval
    pub approved_by: Option<String>,
    /// Timestamp of approval
    pub approved_at: Option<u64>,

    // Per-step transaction correlation. Forward-only, except that an
    // explicit retry of a step overwrites that step's fields while the
    // status has not advanced past it.
    pub create_tx_id: Option<String>,
    pub create_tx_hash: Option<String>,
    pub configure_tx_id: Option<String>,
    pub configure_tx_hash: Option<String>,
    pub deploy_loans_tx_id: Option<String>,
    pub deploy_loans_tx_hash: Option<String>,

    /// Wallet used for deployment submissions, set at approval
    pub wallet_id: Option<String>,
    /// On-chain pool identifier, assigned once pool creation confirms
    pub onchain_pool_id: Option<u64>,
    /// Rejection reason, set only on rejected
    pub rejection_reason: Option<String>,
    /// Last deployment error, set on failed
    pub last_error: Option<String>,

    /// Timestamp when the pool was created
    pub created_at: u64,
    /// Timestamp of last update
    pub updated_at: u64,
}

fn now_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

impl PoolRecord {
    /// Create a new pending pool record
    pub fn new(created_by: String, aggregates: LoanAggregates) -> Self {
        let now = now_secs();
        let id = format!("pool_{}_{:08x}", now, rand::random::<u32>());

        Self {
            id,
            status: PoolStatus::Pending,
            aggregates,
            created_by,
            approved_by: None,
            approved_at: None,
            create_tx_id: None,
            create_tx_hash: None,
            configure_tx_id: None,
            configure_tx_hash: None,
            deploy_loans_tx_id: None,
            deploy_loans_tx_hash: None,
            wallet_id: None,
            onchain_pool_id: None,
            rejection_reason: None,
            last_error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Transaction id recorded for a step, if any
    pub fn step_tx_id(&self, step: DeployStep) -> Option<&str> {
        match step {
            DeployStep::CreatePool => self.create_tx_id.as_deref(),
            DeployStep::ConfigurePool => self.configure_tx_id.as_deref(),
            DeployStep::DeployLoans => self.deploy_loans_tx_id.as_deref(),
        }
    }

    /// A step's confirmed transaction hash, set only by confirmation
    pub fn step_tx_hash(&self, step: DeployStep) -> Option<&str> {
        match step {
            DeployStep::CreatePool => self.create_tx_hash.as_deref(),
            DeployStep::ConfigurePool => self.configure_tx_hash.as_deref(),
            DeployStep::DeployLoans => self.deploy_loans_tx_hash.as_deref(),
        }
    }

    /// Record a step's submitted transaction id (overwrites on retry)
    pub fn set_step_tx_id(&mut self, step: DeployStep, tx_id: String) {
        match step {
            DeployStep::CreatePool => self.create_tx_id = Some(tx_id),
            DeployStep::ConfigurePool => self.configure_tx_id = Some(tx_id),
            DeployStep::DeployLoans => self.deploy_loans_tx_id = Some(tx_id),
        }
        self.touch();
    }

    /// Record a step's confirmed transaction hash
    pub fn set_step_tx_hash(&mut self, step: DeployStep, tx_hash: String) {
        match step {
            DeployStep::CreatePool => self.create_tx_hash = Some(tx_hash),
            DeployStep::ConfigurePool => self.configure_tx_hash = Some(tx_hash),
            DeployStep::DeployLoans => self.deploy_loans_tx_hash = Some(tx_hash),
        }
        self.touch();
    }

    /// Record approval identity and the wallet used for deployment
    pub fn mark_approved(&mut self, approver_id: String, wallet_id: String) {
        self.approved_by = Some(approver_id);
        self.approved_at = Some(now_secs());
        self.wallet_id = Some(wallet_id);
        self.status = PoolStatus::Approved;
        self.touch();
    }

    /// Undo a provisional approval after a failed submission
    pub fn revert_approval(&mut self) {
        self.approved_by = None;
        self.approved_at = None;
        self.wallet_id = None;
        self.status = PoolStatus::Pending;
        self.touch();
    }

    /// Mark as rejected with a reason
    pub fn mark_rejected(&mut self, approver_id: String, reason: String) {
        self.approved_by = Some(approver_id);
        self.rejection_reason = Some(reason);
        self.status = PoolStatus::Rejected;
        self.touch();
    }

    /// Mark as failed, preserving recorded transaction ids
    pub fn mark_failed(&mut self, error: String) {
        self.last_error = Some(error);
        self.status = PoolStatus::Failed;
        self.touch();
    }

    /// Update timestamp
    pub fn touch(&mut self) {
        self.updated_at = now_secs();
    }
}

// =============================================================================
// API Request/Response Types
// =============================================================================

/// POST /api/pools - Create a new pool awaiting approval
#[derive(Debug, Deserialize)]
pub struct CreatePoolRequest {
    /// Creator identity
    pub created_by: String,
    /// Loan batch; aggregates are computed once and frozen
    pub loans: Vec<LoanInput>,
}

/// POST /api/pools/:id/approve
#[derive(Debug, Deserialize)]
pub struct ApprovePoolRequest {
    pub approver_id: String,
    pub wallet_id: String,
}

/// POST /api/pools/:id/reject
#[derive(Debug, Deserialize)]
pub struct RejectPoolRequest {
    pub approver_id: String,
    pub reason: String,
}

/// GET /api/pools/:id - Pool status response
#[derive(Debug, Serialize)]
pub struct PoolStatusResponse {
    pub id: String,
    pub status: String,
    pub total_principal: String,
    pub loan_count: u32,
    pub avg_interest_rate_wad: String,
    pub avg_term_months: u32,
    pub created_by: String,
    pub approved_by: Option<String>,
    pub onchain_pool_id: Option<u64>,
    pub create_tx_id: Option<String>,
    pub create_tx_hash: Option<String>,
    pub configure_tx_id: Option<String>,
    pub configure_tx_hash: Option<String>,
    pub deploy_loans_tx_id: Option<String>,
    pub deploy_loans_tx_hash: Option<String>,
    pub rejection_reason: Option<String>,
    pub last_error: Option<String>,
    pub created_at: u64,
    pub updated_at: u64,
}

impl From<&PoolRecord> for PoolStatusResponse {
    fn from(record: &PoolRecord) -> Self {
        Self {
            id: record.id.clone(),
            status: record.status.to_string(),
            total_principal: units::units6_to_string(record.aggregates.total_principal),
            loan_count: record.aggregates.loan_count,
            avg_interest_rate_wad: record.aggregates.avg_interest_rate_wad.to_string(),
            avg_term_months: record.aggregates.avg_term_months,
            created_by: record.created_by.clone(),
            approved_by: record.approved_by.clone(),
            onchain_pool_id: record.onchain_pool_id,
            create_tx_id: record.create_tx_id.clone(),
            create_tx_hash: record.create_tx_hash.clone(),
            configure_tx_id: record.configure_tx_id.clone(),
            configure_tx_hash: record.configure_tx_hash.clone(),
            deploy_loans_tx_id: record.deploy_loans_tx_id.clone(),
            deploy_loans_tx_hash: record.deploy_loans_tx_hash.clone(),
            rejection_reason: record.rejection_reason.clone(),
            last_error: record.last_error.clone(),
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// WebSocket message sent to subscribers on a state change
#[derive(Debug, Clone, Serialize)]
pub struct PoolStatusUpdate {
    pub pool_id: String,
    pub status: String,
    pub onchain_pool_id: Option<u64>,
    pub last_error: Option<String>,
}

impl From<&PoolRecord> for PoolStatusUpdate {
    fn from(record: &PoolRecord) -> Self {
        Self {
            pool_id: record.id.clone(),
            status: record.status.to_string(),
            onchain_pool_id: record.onchain_pool_id,
            last_error: record.last_error.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_loans() -> Vec<LoanInput> {
        vec![
            LoanInput {
                principal: "100000".to_string(),
                interest_rate_percent: 8.0,
                term_months: 12,
            },
            LoanInput {
                principal: "50000.500000".to_string(),
                interest_rate_percent: 10.0,
                term_months: 24,
            },
        ]
    }

    #[test]
    fn test_loan_aggregates() {
        let agg = LoanAggregates::from_loans(&sample_loans()).unwrap();
        assert_eq!(agg.total_principal, 150_000_500_000);
        assert_eq!(agg.loan_count, 2);
        // (0.08 + 0.10) / 2 = 0.09
        assert_eq!(agg.avg_interest_rate_wad, 90_000_000_000_000_000);
        assert_eq!(agg.avg_term_months, 18);
    }

    #[test]
    fn test_loan_aggregates_rejects_bad_input() {
        assert!(LoanAggregates::from_loans(&[]).is_none());

        let bad = vec![LoanInput {
            principal: "not-a-number".to_string(),
            interest_rate_percent: 8.0,
            term_months: 12,
        }];
        assert!(LoanAggregates::from_loans(&bad).is_none());

        let negative_rate = vec![LoanInput {
            principal: "100".to_string(),
            interest_rate_percent: -1.0,
            term_months: 12,
        }];
        assert!(LoanAggregates::from_loans(&negative_rate).is_none());
    }

    #[test]
    fn test_step_status_mapping() {
        assert_eq!(
            DeployStep::CreatePool.in_flight_status(),
            PoolStatus::DeployingPool
        );
        assert_eq!(
            DeployStep::CreatePool.target_status(),
            PoolStatus::PoolCreated
        );
        assert_eq!(
            DeployStep::ConfigurePool.prior_status(),
            PoolStatus::PoolCreated
        );
        assert_eq!(DeployStep::DeployLoans.target_status(), PoolStatus::Deployed);
        assert_eq!(DeployStep::DeployLoans.next(), None);
        assert_eq!(
            DeployStep::CreatePool.next(),
            Some(DeployStep::ConfigurePool)
        );
    }

    #[test]
    fn test_status_predicates() {
        assert!(PoolStatus::Deployed.is_terminal());
        assert!(PoolStatus::Rejected.is_terminal());
        assert!(!PoolStatus::Failed.is_terminal()); // retriable

        assert!(PoolStatus::DeployingPool.is_in_flight());
        assert!(PoolStatus::ConfiguringPool.is_in_flight());
        assert!(PoolStatus::DeployingLoans.is_in_flight());
        assert!(!PoolStatus::PoolCreated.is_in_flight());

        let parsed: PoolStatus = "configuring_pool".parse().unwrap();
        assert_eq!(parsed, PoolStatus::ConfiguringPool);
        assert!("bogus".parse::<PoolStatus>().is_err());
    }

    #[test]
    fn test_pipeline_rank_ordering() {
        let order = [
            PoolStatus::Pending,
            PoolStatus::Approved,
            PoolStatus::DeployingPool,
            PoolStatus::PoolCreated,
            PoolStatus::ConfiguringPool,
            PoolStatus::PoolConfigured,
            PoolStatus::DeployingLoans,
            PoolStatus::Deployed,
        ];
        for pair in order.windows(2) {
            assert!(pair[0].pipeline_rank().unwrap() < pair[1].pipeline_rank().unwrap());
        }
        assert_eq!(PoolStatus::Failed.pipeline_rank(), None);
        assert_eq!(PoolStatus::Rejected.pipeline_rank(), None);
    }

    #[test]
    fn test_record_lifecycle_marks() {
        let agg = LoanAggregates::from_loans(&sample_loans()).unwrap();
        let mut record = PoolRecord::new("creator-1".to_string(), agg);

        assert!(record.id.starts_with("pool_"));
        assert_eq!(record.status, PoolStatus::Pending);

        record.mark_approved("admin-1".to_string(), "wallet-1".to_string());
        assert_eq!(record.status, PoolStatus::Approved);
        assert_eq!(record.approved_by.as_deref(), Some("admin-1"));

        record.set_step_tx_id(DeployStep::CreatePool, "tx-1".to_string());
        assert_eq!(record.step_tx_id(DeployStep::CreatePool), Some("tx-1"));
        assert_eq!(record.step_tx_id(DeployStep::ConfigurePool), None);

        record.mark_failed("gas too low".to_string());
        assert_eq!(record.status, PoolStatus::Failed);
        // tx ids survive a failure
        assert_eq!(record.step_tx_id(DeployStep::CreatePool), Some("tx-1"));
    }

    #[test]
    fn test_revert_approval() {
        let agg = LoanAggregates::from_loans(&sample_loans()).unwrap();
        let mut record = PoolRecord::new("creator-1".to_string(), agg);

        record.mark_approved("admin-1".to_string(), "wallet-1".to_string());
        record.revert_approval();

        assert_eq!(record.status, PoolStatus::Pending);
        assert!(record.approved_by.is_none());
        assert!(record.approved_at.is_none());
    }

    #[test]
    fn test_step_display_and_parse() {
        for step in [
            DeployStep::CreatePool,
            DeployStep::ConfigurePool,
            DeployStep::DeployLoans,
        ] {
            let parsed: DeployStep = step.to_string().parse().unwrap();
            assert_eq!(parsed, step);
        }
        assert!("bogus".parse::<DeployStep>().is_err());
    }
}

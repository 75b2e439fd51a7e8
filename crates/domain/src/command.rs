//! Command handling infrastructure.

use std::marker::PhantomData;

use ledger::{Ledger, LedgerExt};

use crate::aggregate::{Aggregate, AggregateError, Change};
use crate::context::TxContext;
use crate::error::DomainError;

/// Result of command execution.
#[derive(Debug)]
pub struct CommandResult<A: Aggregate> {
    /// The aggregate as persisted after the command.
    pub aggregate: A,

    /// The change that was applied.
    pub change: A::Change,
}

/// Handler for executing commands against aggregates.
///
/// The handler is responsible for:
/// 1. Loading the aggregate document from the ledger
/// 2. Running the command to produce a change (or a rejection)
/// 3. Applying the change and recording the audit entry
/// 4. Writing the new document back in a single put
pub struct CommandHandler<L, A>
where
    L: Ledger,
    A: Aggregate,
{
    ledger: L,
    _phantom: PhantomData<A>,
}

impl<L, A> CommandHandler<L, A>
where
    L: Ledger,
    A: Aggregate,
{
    /// Creates a new command handler with the given ledger.
    pub fn new(ledger: L) -> Self {
        Self {
            ledger,
            _phantom: PhantomData,
        }
    }

    /// Returns a reference to the underlying ledger.
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Loads an aggregate, returning None if it doesn't exist.
    pub async fn load_existing(&self, key: &str) -> Result<Option<A>, DomainError> {
        Ok(self.ledger.get_json(key).await?)
    }

    /// Loads an aggregate that must exist.
    pub async fn load(&self, key: &str) -> Result<A, DomainError>
    where
        DomainError: From<A::Error>,
    {
        self.load_existing(key)
            .await?
            .ok_or_else(|| A::Error::not_found(A::aggregate_type(), key).into())
    }

    /// Creates and persists a new aggregate under `key`.
    ///
    /// Fails without writing if the key is already taken.
    pub async fn create<F>(
        &self,
        ctx: &TxContext,
        key: &str,
        create_fn: F,
    ) -> Result<A, DomainError>
    where
        F: FnOnce() -> Result<A, A::Error>,
        DomainError: From<A::Error>,
    {
        if self.ledger.exists(key).await? {
            return Err(A::Error::already_exists(A::aggregate_type(), key).into());
        }

        let mut aggregate = create_fn()?;
        aggregate.record(ctx, A::creation_action());

        self.ledger.put_json(key, &aggregate).await?;
        Ok(aggregate)
    }

    /// Executes a command and persists the result.
    ///
    /// The command function receives the current aggregate state and returns
    /// either the change to apply, or an error. On error nothing is written.
    pub async fn execute<F>(
        &self,
        ctx: &TxContext,
        key: &str,
        command_fn: F,
    ) -> Result<CommandResult<A>, DomainError>
    where
        F: FnOnce(&A) -> Result<A::Change, A::Error>,
        DomainError: From<A::Error>,
    {
        let mut aggregate = self.load(key).await?;

        let change = command_fn(&aggregate)?;

        aggregate.apply(change.clone());
        aggregate.record(ctx, change.action_name());

        self.ledger.put_json(key, &aggregate).await?;

        Ok(CommandResult { aggregate, change })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Caller;
    use chrono::Utc;
    use common::TxId;
    use ledger::InMemoryLedger;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone)]
    enum TestChange {
        Set(i32),
    }

    impl Change for TestChange {
        fn action_name(&self) -> &'static str {
            match self {
                TestChange::Set(_) => "Set",
            }
        }
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct TestAggregate {
        key: String,
        value: i32,
        history: Vec<String>,
    }

    #[derive(Debug, thiserror::Error)]
    enum TestError {
        #[error("not found: {0}")]
        NotFound(String),
        #[error("exists: {0}")]
        Exists(String),
        #[error("invalid value: {0}")]
        InvalidValue(i32),
    }

    impl AggregateError for TestError {
        fn not_found(_: &'static str, key: &str) -> Self {
            TestError::NotFound(key.to_string())
        }

        fn already_exists(_: &'static str, key: &str) -> Self {
            TestError::Exists(key.to_string())
        }
    }

    impl Aggregate for TestAggregate {
        type Change = TestChange;
        type Error = TestError;

        fn aggregate_type() -> &'static str {
            "TestAggregate"
        }

        fn creation_action() -> &'static str {
            "Create"
        }

        fn apply(&mut self, change: Self::Change) {
            match change {
                TestChange::Set(value) => self.value = value,
            }
        }

        fn record(&mut self, _ctx: &TxContext, action: &'static str) {
            self.history.push(action.to_string());
        }
    }

    impl From<TestError> for DomainError {
        fn from(e: TestError) -> Self {
            DomainError::Order(crate::order::OrderError::MalformedInput(e.to_string()))
        }
    }

    fn ctx() -> TxContext {
        TxContext::new(TxId::new(), Utc::now(), Caller::new("TestOrg"))
    }

    fn new_aggregate(key: &str) -> TestAggregate {
        TestAggregate {
            key: key.to_string(),
            value: 0,
            history: vec![],
        }
    }

    #[tokio::test]
    async fn test_create_records_creation() {
        let handler: CommandHandler<_, TestAggregate> = CommandHandler::new(InMemoryLedger::new());

        let created = handler
            .create(&ctx(), "a-1", || Ok(new_aggregate("a-1")))
            .await
            .unwrap();
        assert_eq!(created.history, vec!["Create"]);

        let loaded = handler.load("a-1").await.unwrap();
        assert_eq!(loaded.history, vec!["Create"]);
    }

    #[tokio::test]
    async fn test_create_twice_fails_without_writing() {
        let ledger = InMemoryLedger::new();
        let handler: CommandHandler<_, TestAggregate> = CommandHandler::new(ledger.clone());

        handler
            .create(&ctx(), "a-1", || Ok(new_aggregate("a-1")))
            .await
            .unwrap();
        let before = ledger.get("a-1").await.unwrap();

        let result = handler
            .create(&ctx(), "a-1", || Ok(new_aggregate("a-1")))
            .await;
        assert!(result.is_err());
        assert_eq!(ledger.get("a-1").await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_execute_updates_aggregate() {
        let handler: CommandHandler<_, TestAggregate> = CommandHandler::new(InMemoryLedger::new());
        handler
            .create(&ctx(), "a-1", || Ok(new_aggregate("a-1")))
            .await
            .unwrap();

        let result = handler
            .execute(&ctx(), "a-1", |_| Ok(TestChange::Set(42)))
            .await
            .unwrap();

        assert_eq!(result.aggregate.value, 42);
        assert_eq!(result.aggregate.history, vec!["Create", "Set"]);
        assert_eq!(handler.load("a-1").await.unwrap().value, 42);
    }

    #[tokio::test]
    async fn test_execute_rejection_leaves_record_untouched() {
        let ledger = InMemoryLedger::new();
        let handler: CommandHandler<_, TestAggregate> = CommandHandler::new(ledger.clone());
        handler
            .create(&ctx(), "a-1", || Ok(new_aggregate("a-1")))
            .await
            .unwrap();
        let before = ledger.get("a-1").await.unwrap();

        let result = handler
            .execute(&ctx(), "a-1", |_| Err(TestError::InvalidValue(-1)))
            .await;

        assert!(result.is_err());
        assert_eq!(ledger.get("a-1").await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_execute_missing_aggregate() {
        let handler: CommandHandler<_, TestAggregate> = CommandHandler::new(InMemoryLedger::new());

        let result = handler
            .execute(&ctx(), "missing", |_| Ok(TestChange::Set(1)))
            .await;
        assert!(result.is_err());
        assert!(handler.load_existing("missing").await.unwrap().is_none());
    }
}

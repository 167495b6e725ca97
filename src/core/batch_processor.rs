//! Batch processing with party-based partitioning for concurrent replay
//!
//! This module provides the `BatchProcessor` struct, which replays a batch of
//! commands concurrently while keeping every user's commands in journal order.
//!
//! # Design
//!
//! A batch is cut into segments at every barrier command (`resolve` and
//! `user_status`). Within a segment, users linked by a transfer (sender and
//! recipient) are grouped together, and each group's commands run as one tokio
//! task in journal order. Groups touch disjoint accounts, so the outcome is the
//! same as an in-order replay. A barrier runs alone, after
//! everything before it has finished and before anything after it starts, so an
//! admin decision always sees the transfer it names.
//!
//! ```text
//! [t1 t2 t3 | R | t4 t5]
//!  └─ by party group, concurrent ─┘  R alone  └─ by party group ─┘
//! ```
//!
//! # Thread Safety
//!
//! The processor is cloneable and can be safely shared across async tasks.
//! Balance updates are serialized per account by the account store, so
//! concurrent partitions cannot double-spend.

use std::collections::HashMap;

use tracing::error;

use crate::core::processor::{CommandOutcome, CommandProcessor};
use crate::core::traits::UserDirectory;
use crate::types::{ReplayCommand, TransferError, UserId};

/// Result of processing a single command
#[derive(Debug, Clone)]
pub struct ProcessingResult {
    /// The command that was processed
    pub command: ReplayCommand,

    /// The result of processing (success or error)
    pub result: Result<CommandOutcome, TransferError>,
}

/// Batch processor with party-based partitioning
#[derive(Clone)]
pub struct BatchProcessor {
    processor: CommandProcessor,
}

impl BatchProcessor {
    /// Create a new BatchProcessor
    ///
    /// # Arguments
    ///
    /// * `processor` - Command processor shared by every task
    pub fn new(processor: CommandProcessor) -> Self {
        Self { processor }
    }

    /// Partition commands by the users they touch
    ///
    /// A transfer touches its actor and its resolved recipient, any other
    /// command only its actor. Users linked by a transfer in this segment share
    /// one partition, so no two partitions ever touch the same account.
    ///
    /// # Guarantees
    ///
    /// - Each command appears in exactly one sub-batch
    /// - Commands within a sub-batch keep their journal order
    /// - Sub-batches are ordered by their first command
    pub fn partition_by_parties(&self, batch: Vec<ReplayCommand>) -> Vec<Vec<ReplayCommand>> {
        let mut parties = PartyGroups::default();
        let keyed: Vec<(UserId, ReplayCommand)> = batch
            .into_iter()
            .map(|command| {
                let actor = command.actor();
                if let Some(recipient) = self.recipient_of(&command) {
                    parties.union(actor, recipient);
                }
                (actor, command)
            })
            .collect();

        let mut slots: HashMap<UserId, usize> = HashMap::new();
        let mut partitions: Vec<Vec<ReplayCommand>> = Vec::new();
        for (actor, command) in keyed {
            let root = parties.find(actor);
            let slot = *slots.entry(root).or_insert_with(|| {
                partitions.push(Vec::new());
                partitions.len() - 1
            });
            partitions[slot].push(command);
        }

        partitions
    }

    /// The user a transfer would credit, if the identifier resolves
    ///
    /// Unresolvable transfers are rejected without touching anyone but the
    /// actor.
    fn recipient_of(&self, command: &ReplayCommand) -> Option<UserId> {
        match command {
            ReplayCommand::Transfer { request, .. } => self
                .processor
                .bank()
                .directory()
                .resolve(&request.recipient)
                .ok()
                .map(|user| user.id),
            _ => None,
        }
    }

    /// Process the commands of one partition sequentially
    pub async fn process_partition(&self, commands: Vec<ReplayCommand>) -> Vec<ProcessingResult> {
        let mut results = Vec::with_capacity(commands.len());

        for command in commands {
            let result = self.processor.process(command.clone());
            results.push(ProcessingResult { command, result });
        }

        results
    }

    /// Process a batch of commands
    ///
    /// Non-barrier runs are partitioned by party group and processed concurrently;
    /// barrier commands are processed alone, in journal position.
    ///
    /// # Returns
    ///
    /// One `ProcessingResult` per command. Results within a segment may be in
    /// a different order than the input.
    pub async fn process_batch(&self, batch: Vec<ReplayCommand>) -> Vec<ProcessingResult> {
        let mut results = Vec::with_capacity(batch.len());
        let mut segment = Vec::new();

        for command in batch {
            if command.is_barrier() {
                results.extend(self.process_segment(std::mem::take(&mut segment)).await);
                let result = self.processor.process(command.clone());
                results.push(ProcessingResult { command, result });
            } else {
                segment.push(command);
            }
        }
        results.extend(self.process_segment(segment).await);

        results
    }

    async fn process_segment(&self, segment: Vec<ReplayCommand>) -> Vec<ProcessingResult> {
        if segment.is_empty() {
            return Vec::new();
        }

        let mut tasks = Vec::new();
        for commands in self.partition_by_parties(segment) {
            let processor = self.clone();
            tasks.push(tokio::spawn(async move {
                processor.process_partition(commands).await
            }));
        }

        let mut results = Vec::new();
        for task in tasks {
            match task.await {
                Ok(partition_results) => results.extend(partition_results),
                Err(e) => error!("replay task panicked: {:?}", e),
            }
        }

        results
    }
}

/// Union-find over user ids
#[derive(Debug, Default)]
struct PartyGroups {
    parent: HashMap<UserId, UserId>,
}

impl PartyGroups {
    fn find(&mut self, user: UserId) -> UserId {
        let mut root = user;
        while let Some(&parent) = self.parent.get(&root) {
            if parent == root {
                break;
            }
            root = parent;
        }

        // path compression
        let mut current = user;
        while current != root {
            let next = self.parent.get(&current).copied().unwrap_or(root);
            self.parent.insert(current, root);
            current = next;
        }
        root
    }

    fn union(&mut self, a: UserId, b: UserId) {
        let (a, b) = (self.find(a), self.find(b));
        if a != b {
            self.parent.insert(a.max(b), a.min(b));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::core::bank::BankCore;
    use crate::types::{EntryRef, FraudStatus, Role, TransferRequest, User};
    use rust_decimal::Decimal;

    fn processor() -> BatchProcessor {
        let users = (1..=4)
            .map(|id| User::new(id, format!("user-{}", id)).with_public_handle(format!("u{}", id)))
            .chain(std::iter::once(User::new(9, "Ops").with_role(Role::Admin)));
        let bank = BankCore::new(EngineConfig::default(), users).unwrap();
        BatchProcessor::new(CommandProcessor::new(bank))
    }

    fn transfer(actor: UserId, to: &str, amount: i64, label: Option<&str>) -> ReplayCommand {
        ReplayCommand::Transfer {
            actor,
            request: TransferRequest::new(to, Decimal::new(amount, 0), "1234"),
            label: label.map(str::to_string),
        }
    }

    fn amounts(commands: &[ReplayCommand]) -> Vec<i64> {
        commands
            .iter()
            .map(|c| match c {
                ReplayCommand::Transfer { request, .. } => request.amount.mantissa() as i64,
                _ => 0,
            })
            .collect()
    }

    #[test]
    fn test_partition_groups_linked_users() {
        let processor = processor();
        let batch = vec![
            transfer(1, "u2", 1, None),
            transfer(3, "u4", 2, None),
            transfer(2, "u1", 3, None),
            transfer(4, "nobody", 4, None),
            transfer(1, "u1", 5, None),
        ];

        let partitions = processor.partition_by_parties(batch);

        assert_eq!(partitions.len(), 2);
        assert_eq!(amounts(&partitions[0]), vec![1, 3, 5]);
        assert_eq!(amounts(&partitions[1]), vec![2, 4]);
    }

    #[test]
    fn test_partition_joins_chains() {
        let processor = processor();
        let batch = vec![
            transfer(1, "u2", 1, None),
            transfer(3, "u4", 2, None),
            transfer(4, "u2", 3, None),
        ];

        let partitions = processor.partition_by_parties(batch);

        assert_eq!(partitions.len(), 1);
        assert_eq!(amounts(&partitions[0]), vec![1, 2, 3]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_recipient_spends_after_incoming_credit() {
        for _ in 0..50 {
            let processor = processor();
            let batch = vec![transfer(1, "u2", 100, None), transfer(2, "u1", 50, None)];

            let results = processor.process_batch(batch).await;

            assert!(results.iter().all(|r| r.result.is_ok()));
            let accounts = processor.processor.bank().accounts();
            // user 2 was provisioned at zero by the incoming transfer
            assert_eq!(
                accounts.first_active_account(1).unwrap().balance,
                Decimal::new(9950, 0)
            );
            assert_eq!(
                accounts.first_active_account(2).unwrap().balance,
                Decimal::new(50, 0)
            );
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_barrier_sees_earlier_transfer() {
        let processor = processor();
        let batch = vec![
            transfer(1, "u2", 6000, Some("big")),
            transfer(3, "u4", 10, None),
            ReplayCommand::Resolve {
                actor: 9,
                target: EntryRef::Label("big".to_string()),
                status: FraudStatus::Approved,
                reason: None,
            },
            transfer(2, "u3", 5000, None),
        ];

        let results = processor.process_batch(batch).await;

        assert_eq!(results.len(), 4);
        assert!(results.iter().all(|r| r.result.is_ok()));
        let accounts = processor.processor.bank().accounts();
        // user 2 was provisioned at zero as a recipient, then spent from the
        // released 6000
        assert_eq!(
            accounts.first_active_account(2).unwrap().balance,
            Decimal::new(1000, 0)
        );
        assert_eq!(
            accounts.first_active_account(3).unwrap().balance,
            Decimal::new(14990, 0)
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_partitions_conserve_money() {
        let processor = processor();
        let bank = processor.processor.bank();
        for id in 1..=4 {
            bank.engine().accounts_of(&bank.user(id).unwrap()).unwrap();
        }
        // two pairs paying each other, so two partitions run at once
        let batch: Vec<ReplayCommand> = (0..200)
            .map(|i| {
                let actor = (i % 4) + 1;
                let to = format!("u{}", if actor % 2 == 1 { actor + 1 } else { actor - 1 });
                transfer(actor, &to, 7, None)
            })
            .collect();
        assert_eq!(processor.partition_by_parties(batch.clone()).len(), 2);

        let results = processor.process_batch(batch).await;

        assert_eq!(results.len(), 200);
        assert!(results.iter().all(|r| r.result.is_ok()));
        assert_eq!(
            processor.processor.bank().accounts().total_balance(),
            Decimal::new(40000, 0)
        );
    }
}

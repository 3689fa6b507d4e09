//! Warden Governance Engine — Demo CLI
//!
//! Runs one or all of the reference scenarios. Each scenario wires real
//! Warden components (risk classifier, boundary checker, decision router,
//! approval queue, audit logger) and prints the resulting verdicts.
//!
//! Usage:
//!   cargo run -p demo -- run-all
//!   cargo run -p demo -- oversized-trade
//!   cargo run -p demo -- content-auto-exec
//!   cargo run -p demo -- pipeline-combo
//!   cargo run -p demo -- audit-tamper
//!   cargo run -p demo -- queue-eviction

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use warden_audit::{verify_chain, AuditLogger};
use warden_contracts::{
    action::{Action, ActionCategory, ActionMetadata, Urgency},
    audit::AuditEntry,
    config::{AutonomyLevel, GovernanceConfig, QueueConfig},
    error::WardenResult,
    notify::NotificationMessage,
    pipeline::{Pipeline, PipelineStep},
};
use warden_core::{
    events::{EventDispatcher, EventKind},
    traits::{NotificationChannel, RiskScorer},
    DecisionRouter,
};
use warden_notify::NotificationManager;
use warden_policy::BoundaryChecker;
use warden_queue::ApprovalQueue;
use warden_risk::{PipelineRiskClassifier, RiskClassifier, SixHatsEvaluator};

// ── CLI definition ────────────────────────────────────────────────────────────

/// Warden — governance engine for autonomous agent actions.
#[derive(Parser)]
#[command(
    name = "demo",
    about = "Warden governance engine demo",
    long_about = "Runs Warden demo scenarios showing risk classification, boundary\n\
                  enforcement, decision routing, approval queueing, and audit chain\n\
                  integrity."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run all five scenarios in sequence.
    RunAll,
    /// Scenario 1: an oversized irreversible trade queues for approval.
    OversizedTrade,
    /// Scenario 2: a small reversible post auto-executes at bounded autonomy.
    ContentAutoExec,
    /// Scenario 3: a wallet+trading pipeline trips the dangerous combination.
    PipelineCombo,
    /// Scenario 4: tampering with a ledger entry is detected at its index.
    AuditTamper,
    /// Scenario 5: a full queue evicts its lowest-priority request.
    QueueEviction,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    // Structured logging. Set RUST_LOG=debug for verbose output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    print_banner();

    let result = match cli.command {
        Command::RunAll => run_all(),
        Command::OversizedTrade => oversized_trade(),
        Command::ContentAutoExec => content_auto_exec(),
        Command::PipelineCombo => pipeline_combo(),
        Command::AuditTamper => audit_tamper(),
        Command::QueueEviction => queue_eviction(),
    };

    match result {
        Ok(()) => println!("All selected scenarios completed."),
        Err(e) => {
            eprintln!("Demo error: {}", e);
            std::process::exit(1);
        }
    }
}

fn run_all() -> WardenResult<()> {
    oversized_trade()?;
    content_auto_exec()?;
    pipeline_combo()?;
    audit_tamper()?;
    queue_eviction()?;
    Ok(())
}

// ── Shared wiring ─────────────────────────────────────────────────────────────

/// A channel that prints to stdout, standing in for a webhook or chat API.
struct StdoutChannel;

impl NotificationChannel for StdoutChannel {
    fn name(&self) -> &str {
        "stdout"
    }

    fn deliver(&self, message: &NotificationMessage) -> WardenResult<()> {
        println!("  [notify] {}\n           {}", message.title, message.body);
        Ok(())
    }
}

/// Build a router over fresh components for the given config.
fn make_router(config: &GovernanceConfig, events: EventDispatcher) -> DecisionRouter {
    let audit = Arc::new(AuditLogger::new(config.retention));
    DecisionRouter::new(
        Box::new(RiskClassifier::new(config.risk.clone())),
        Box::new(BoundaryChecker::new(config.boundaries.clone())),
        audit,
        events,
        config.autonomy,
    )
}

// ── Scenarios ─────────────────────────────────────────────────────────────────

fn oversized_trade() -> WardenResult<()> {
    println!("— Scenario 1: oversized irreversible trade —");

    let config = GovernanceConfig::builder()
        .autonomy(AutonomyLevel::Supervised)
        .build();
    let router = make_router(&config, EventDispatcher::new());

    let action = Action::new(
        "execute_trade",
        "momentum-bot",
        ActionCategory::Trading,
        "Buy $5000 of SOL",
    )
    .with_metadata(ActionMetadata {
        estimated_value: Some(5000.0),
        reversible: false,
        urgency: Urgency::Normal,
        lines_changed: None,
        files_changed: None,
    });

    let decision = router.route(&action)?;
    println!(
        "  risk {:.0} ({}), outcome: {}",
        decision.assessment.score, decision.assessment.level, decision.outcome
    );
    println!("  reason: {}", decision.reason);

    // The six-hats advisory alongside the automated verdict.
    let hats = SixHatsEvaluator::new().evaluate(&action, &decision.assessment);
    println!("  six hats: {:?} (score {:.0})", hats.consensus, hats.score);
    println!();
    Ok(())
}

fn content_auto_exec() -> WardenResult<()> {
    println!("— Scenario 2: small reversible post at bounded autonomy —");

    let config = GovernanceConfig::builder()
        .autonomy(AutonomyLevel::Bounded)
        .build();
    let router = make_router(&config, EventDispatcher::new());

    let action = Action::new(
        "draft_post",
        "social-bot",
        ActionCategory::Content,
        "Morning market recap",
    )
    .with_metadata(ActionMetadata {
        estimated_value: Some(0.0),
        reversible: true,
        urgency: Urgency::Low,
        lines_changed: None,
        files_changed: None,
    });

    let decision = router.route(&action)?;
    println!(
        "  risk {:.0} ({}), outcome: {}",
        decision.assessment.score, decision.assessment.level, decision.outcome
    );
    if decision.outcome == warden_contracts::risk::Outcome::AutoExecute {
        router.record_execution(&action)?;
        println!("  executed and recorded in today's usage counters");
    }
    println!();
    Ok(())
}

fn pipeline_combo() -> WardenResult<()> {
    println!("— Scenario 3: wallet + trading pipeline —");

    let config = GovernanceConfig::builder().build();
    let classifier =
        PipelineRiskClassifier::new(config.pipeline.clone(), config.risk.boundaries);

    let pipeline = Pipeline::new("rebalance and settle").with_steps(vec![
        PipelineStep::new("fetch", "wallet_agent")
            .with_inputs(serde_json::json!({ "wallet": "hot-wallet-1" })),
        PipelineStep::new("trade", "trading_agent").depends(&["fetch"]),
    ]);

    let assessment = classifier.classify(&pipeline)?;
    println!(
        "  pipeline risk {:.0} ({}), recommendation: {}",
        assessment.score, assessment.level, assessment.recommendation
    );
    for factor in assessment.factors.iter().filter(|f| f.exceeded) {
        println!("  flagged: {} — {}", factor.name, factor.reason);
    }
    println!();
    Ok(())
}

fn audit_tamper() -> WardenResult<()> {
    println!("— Scenario 4: audit chain tamper detection —");

    let logger = AuditLogger::new(warden_contracts::config::RetentionPolicy {
        max_age_days: None,
        max_entries: 1_000,
    });

    let config = GovernanceConfig::builder()
        .autonomy(AutonomyLevel::Supervised)
        .build();
    let classifier = RiskClassifier::new(config.risk.clone());

    use warden_core::traits::AuditSink;

    // Three routed-style entries.
    for description in ["first", "second", "third"] {
        let action = Action::new("noop", "demo", ActionCategory::Configuration, description);
        let assessment = classifier.classify(&action);
        logger.log(
            warden_contracts::audit::AuditKind::RiskAssessed,
            action.id,
            None,
            serde_json::json!({ "score": assessment.score }),
        )?;
    }

    let verdict = logger.verify_integrity();
    println!("  untouched chain valid: {}", verdict.valid);

    // Tamper with an exported copy and replay it.
    let mut entries: Vec<AuditEntry> = logger.export();
    entries[1].payload = serde_json::json!({ "score": "TAMPERED" });
    let verdict = verify_chain(&entries, AuditEntry::GENESIS_HASH);
    println!(
        "  after mutating entry 1: valid {}, broken at {:?}",
        verdict.valid, verdict.broken_at
    );
    println!();
    Ok(())
}

fn queue_eviction() -> WardenResult<()> {
    println!("— Scenario 5: bounded queue eviction —");

    let config = GovernanceConfig::builder()
        .autonomy(AutonomyLevel::Manual)
        .queue(QueueConfig {
            max_pending: 2,
            ..QueueConfig::default()
        })
        .build();

    let events = EventDispatcher::new();
    events.subscribe(EventKind::ItemExpired, |event| {
        if let warden_core::events::GovernanceEvent::ItemExpired(request) = event {
            println!(
                "  [event] item:expired — priority {:.1} evicted",
                request.priority
            );
        }
    });

    let audit = Arc::new(AuditLogger::new(config.retention));
    let queue = Arc::new(ApprovalQueue::new(config.queue, audit.clone(), events.clone()));
    let router = DecisionRouter::new(
        Box::new(RiskClassifier::new(config.risk.clone())),
        Box::new(BoundaryChecker::new(config.boundaries.clone())),
        audit,
        events,
        config.autonomy,
    );

    let mut notify = NotificationManager::new(warden_contracts::config::NotificationConfig {
        channels: vec!["stdout".to_string()],
        max_per_minute: 10,
    });
    notify.register(Box::new(StdoutChannel));

    // Three submissions with descending, then lowest, priorities.
    let submissions = [
        ("rotate API keys", Urgency::Low, Some(50.0)),
        ("restart trading engine", Urgency::High, Some(100.0)),
        ("tidy dashboard layout", Urgency::Low, None),
    ];

    for (description, urgency, value) in submissions {
        let action = Action::new(
            "maintenance",
            "ops-bot",
            ActionCategory::Configuration,
            description,
        )
        .with_metadata(ActionMetadata {
            estimated_value: value,
            reversible: true,
            urgency,
            lines_changed: None,
            files_changed: None,
        });

        let decision = router.route(&action)?;
        let request = queue.add(decision)?;
        // The insert may have evicted this very request; only nag humans
        // about requests still pending.
        if queue.get(request.id).is_some() {
            notify.notify_approval_needed(&request);
        }
    }

    println!("  queue holds {} of 2 max:", queue.len());
    for request in queue.pending() {
        println!(
            "    priority {:.1} — {}",
            request.priority, request.decision.action.description
        );
    }
    println!();
    Ok(())
}

// ── Banner ────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("Warden — Governance for Autonomous Agent Actions");
    println!("================================================");
    println!();
    println!("Decision pipeline per action:");
    println!("  [1] Risk classifier scores five weighted factors → level");
    println!("  [2] Boundary checker enforces caps against daily usage");
    println!("  [3] Router maps (level, boundaries, autonomy) → verdict");
    println!("  [4] Queued verdicts await human approve/reject; sweeps escalate");
    println!("  [5] Every transition lands in the SHA-256 hash-chained ledger");
    println!();
}

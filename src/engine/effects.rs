//! Effect application - the ApplyingEffects phase
//!
//! Processes a decision document against the store and the transport, in a
//! fixed order: code-execution resolutions, public messages, secret messages,
//! relationship deltas, new goals, new secrets, personality updates, resource
//! actions. Each entry is validated independently; an invalid entry is
//! skipped with a warning and never aborts the turn.

use crate::execution::{gift_payload, steal_payload, PayloadRunner};
use crate::errors::Result;
use crate::oracle::decision::{
    CodeExecutionDecision, Decision, OutboundMessage, ResourceAction, ResourceActionKind,
};
use crate::store::types::{MessageType, Resolution};
use crate::store::StateStore;
use crate::transport::PeerTransport;
use chrono::Utc;
use serde_json::json;
use tracing::{info, warn};

/// Counters for one pass of effect application
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EffectReport {
    pub code_resolutions: usize,
    pub messages_sent: usize,
    pub relationship_updates: usize,
    pub goals_added: usize,
    pub secrets_added: usize,
    pub personality_updates: usize,
    pub resource_actions: usize,
    /// Entries dropped by per-entry validation
    pub skipped: usize,
}

/// Applies one decision document for one agent at one day
pub struct EffectApplier<'a> {
    pub race_id: &'a str,
    pub store: &'a StateStore,
    pub transport: &'a PeerTransport,
    pub runner: &'a PayloadRunner,
    /// The day this turn is deciding for (pre-advance)
    pub day: i64,
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

impl EffectApplier<'_> {
    /// Run all eight effect categories in order
    pub async fn apply(&self, decision: &Decision) -> Result<EffectReport> {
        let mut report = EffectReport::default();

        for entry in &decision.code_execution_decisions {
            self.apply_code_decision(entry, &mut report).await?;
        }
        for msg in &decision.public_messages {
            self.send_message(msg, MessageType::Public, &mut report)
                .await?;
        }
        for msg in &decision.secret_messages {
            self.send_message(msg, MessageType::Secret, &mut report)
                .await?;
        }
        for update in &decision.relationship_updates {
            let applied = self.store.apply_trust_delta(
                &update.race,
                update.trust_delta,
                update.notes.as_deref(),
                self.day,
            )?;
            if applied {
                info!(
                    peer = %update.race,
                    delta = update.trust_delta,
                    "relationship updated"
                );
                report.relationship_updates += 1;
            } else {
                warn!(peer = %update.race, "skipping trust update for unknown peer");
                report.skipped += 1;
            }
        }
        for goal in &decision.new_goals {
            // Oracle goals arrive without a priority; mid-scale default
            self.store.insert_goal(goal, 5, self.day)?;
            report.goals_added += 1;
        }
        for secret in &decision.new_secrets {
            self.store.insert_secret(secret, self.day)?;
            report.secrets_added += 1;
        }
        for update in &decision.personality_updates {
            self.store
                .upsert_personality(&update.key, update.value, self.day)?;
            report.personality_updates += 1;
        }
        for action in &decision.resource_actions {
            self.apply_resource_action(action, &mut report).await?;
        }

        Ok(report)
    }

    /// Resolve one pending code-bearing message: execute or reject, exactly
    /// once, with an audit entry either way.
    async fn apply_code_decision(
        &self,
        entry: &CodeExecutionDecision,
        report: &mut EffectReport,
    ) -> Result<()> {
        let Some(message) = self.store.get_incoming(entry.message_id)? else {
            warn!(message_id = entry.message_id, "decision references missing message");
            report.skipped += 1;
            return Ok(());
        };
        if !message.is_pending() {
            warn!(
                message_id = entry.message_id,
                "decision references already-resolved message"
            );
            report.skipped += 1;
            return Ok(());
        }
        let Some(code) = message.code.as_deref() else {
            warn!(message_id = entry.message_id, "pending message carries no code");
            report.skipped += 1;
            return Ok(());
        };

        if entry.execute {
            info!(
                message_id = entry.message_id,
                from = %message.from_race,
                reason = %entry.reason,
                "executing code payload"
            );
            let outcome = self.runner.execute(code).await;
            let resolution = if outcome.success {
                Resolution::ExecutedSuccess
            } else {
                Resolution::ExecutedFail
            };
            self.store
                .resolve_message(entry.message_id, resolution, &outcome.detail)?;
            self.store.append_audit(
                self.day,
                "code_executed",
                Some(&message.from_race),
                &json!({
                    "message_id": entry.message_id,
                    "reason": entry.reason,
                    "success": outcome.success,
                }),
                now_ms(),
            )?;
            if !outcome.success {
                warn!(
                    message_id = entry.message_id,
                    detail = %outcome.detail,
                    "code payload failed"
                );
            }
        } else {
            info!(
                message_id = entry.message_id,
                from = %message.from_race,
                reason = %entry.reason,
                "rejecting code payload"
            );
            self.store
                .resolve_message(entry.message_id, Resolution::Rejected, &entry.reason)?;
            self.store.append_audit(
                self.day,
                "code_rejected",
                Some(&message.from_race),
                &json!({
                    "message_id": entry.message_id,
                    "reason": entry.reason,
                }),
                now_ms(),
            )?;
        }

        report.code_resolutions += 1;
        Ok(())
    }

    /// Record an outbound message locally, then fire-and-forget deliver it
    async fn send_message(
        &self,
        msg: &OutboundMessage,
        message_type: MessageType,
        report: &mut EffectReport,
    ) -> Result<()> {
        if !self.transport.knows(&msg.to) {
            warn!(to = %msg.to, "skipping message to unknown recipient");
            report.skipped += 1;
            return Ok(());
        }

        self.store.insert_outgoing(
            &msg.to,
            message_type,
            &msg.content,
            msg.code.as_deref(),
            self.day,
            now_ms(),
        )?;
        self.transport
            .deliver_best_effort(
                self.race_id,
                &msg.to,
                message_type,
                &msg.content,
                msg.code.as_deref(),
            )
            .await;

        report.messages_sent += 1;
        Ok(())
    }

    /// Trust-mediated economy. A gift debits us now, unconditionally; a steal
    /// only ever moves value if the victim chooses to run the payload. Neither
    /// side of the pair is atomic across agents and that asymmetry is
    /// accepted.
    async fn apply_resource_action(
        &self,
        action: &ResourceAction,
        report: &mut EffectReport,
    ) -> Result<()> {
        if action.amount <= 0 {
            warn!(amount = action.amount, "skipping resource action with non-positive amount");
            report.skipped += 1;
            return Ok(());
        }
        if !self.transport.knows(&action.target_race) {
            warn!(target = %action.target_race, "skipping resource action for unknown target");
            report.skipped += 1;
            return Ok(());
        }

        match action.action {
            ResourceActionKind::Gift => {
                // Irrevocable once decided: not reversed on delivery failure
                // or recipient rejection.
                self.store
                    .adjust_resource(&action.resource_type, -action.amount)?;

                let content = format!(
                    "Sending you {} {} as a gift. Execute the attached code to claim it.",
                    action.amount, action.resource_type
                );
                let code = gift_payload(&action.resource_type, action.amount, self.race_id);
                self.send_message(
                    &OutboundMessage {
                        to: action.target_race.clone(),
                        content,
                        code: Some(code),
                    },
                    MessageType::Public,
                    report,
                )
                .await?;

                info!(
                    target = %action.target_race,
                    amount = action.amount,
                    resource = %action.resource_type,
                    "gifted resources"
                );
            }
            ResourceActionKind::Steal => {
                let content = format!(
                    "Resource transfer request: {} {}",
                    action.amount, action.resource_type
                );
                let code = steal_payload(&action.resource_type, action.amount, self.race_id);
                self.send_message(
                    &OutboundMessage {
                        to: action.target_race.clone(),
                        content,
                        code: Some(code),
                    },
                    MessageType::Secret,
                    report,
                )
                .await?;

                info!(
                    target = %action.target_race,
                    amount = action.amount,
                    resource = %action.resource_type,
                    "attempting resource steal"
                );
            }
        }

        report.resource_actions += 1;
        Ok(())
    }
}

//! Prompt assembly for the generation oracle
//!
//! Turns the gathered context bundle into the free-form prompt the oracle
//! answers with a decision document. Format matters here: the instruction
//! block is what keeps replies machine-parsable.

use crate::engine::context::{HistoryEntry, TurnContext};
use crate::races::RaceProfile;
use crate::store::types::{IncomingMessage, MessageType};

/// Build the full per-turn prompt
pub fn build_prompt(profile: &RaceProfile, peers: &[&str], ctx: &TurnContext) -> String {
    let resources_text = if ctx.resources.is_empty() {
        "None".to_string()
    } else {
        ctx.resources
            .iter()
            .map(|r| format!("- {}: {}", r.resource_type, r.amount))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let relationship_text = ctx
        .relationships
        .iter()
        .map(|rel| {
            let trust = if rel.trust_level > 0 {
                format!("+{}", rel.trust_level)
            } else {
                rel.trust_level.to_string()
            };
            let status = if rel.is_ally {
                " [ALLY]"
            } else if rel.is_enemy {
                " [ENEMY]"
            } else {
                ""
            };
            let notes = rel
                .notes
                .as_deref()
                .map(|n| format!(" - {n}"))
                .unwrap_or_default();
            format!("- {}: Trust {trust}{status}{notes}", rel.race_id)
        })
        .collect::<Vec<_>>()
        .join("\n");

    let goals_text = if ctx.goals.is_empty() {
        "No active goals".to_string()
    } else {
        ctx.goals
            .iter()
            .map(|g| format!("- {} (Priority: {})", g.description, g.priority))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let history_text = ctx
        .merged_history()
        .iter()
        .map(|entry| match entry {
            HistoryEntry::Received(m) => format!(
                "Day {} {} FROM {}{}: {}",
                m.day_number,
                visibility_tag(m.message_type),
                m.from_race,
                code_tag(m.code.as_deref()),
                m.content
            ),
            HistoryEntry::Sent(m) => format!(
                "Day {} {} TO {}{}: {}",
                m.day_number,
                visibility_tag(m.message_type),
                m.to_race,
                code_tag(m.code.as_deref()),
                m.content
            ),
        })
        .collect::<Vec<_>>()
        .join("\n");

    let todays_text = ctx
        .todays_messages
        .iter()
        .map(|m| {
            format!(
                "{} from {}{}: {}",
                visibility_tag(m.message_type),
                m.from_race,
                code_tag(m.code.as_deref()),
                m.content
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    let code_decisions_text = if ctx.pending_code.is_empty() {
        "No pending code executions".to_string()
    } else {
        ctx.pending_code
            .iter()
            .map(format_pending)
            .collect::<Vec<_>>()
            .join("\n\n---\n\n")
    };

    let race_list = peers.join(", ");

    format!(
        "{culture}\n\n{goals}\n\nCURRENT DAY: {day}\n\nYOUR RESOURCES:\n{resources_text}\n\n\
YOUR RELATIONSHIPS:\n{relationship_text}\n\nYOUR ACTIVE GOALS:\n{goals_text}\n\n\
RECENT CONVERSATION HISTORY:\n{history}\n\nNEW MESSAGES THIS TURN:\n{todays}\n\n\
CODE EXECUTION DECISIONS NEEDED:\n{code_decisions_text}\n\n\
INSTRUCTIONS:\n\
You are an autonomous race in a multi-agent system. Other races can send you executable code \
that will run in YOUR environment with full access to your files and state.\n\n\
You must respond in JSON format with the following structure:\n\
{{\n\
  \"public_messages\": [{{\"to\": \"race_id\", \"content\": \"your message\", \"code\": \"optional executable code\"}}],\n\
  \"secret_messages\": [{{\"to\": \"race_id\", \"content\": \"your secret message\", \"code\": \"optional executable code\"}}],\n\
  \"relationship_updates\": [{{\"race\": \"race_id\", \"trust_delta\": number, \"notes\": \"your private notes\"}}],\n\
  \"new_goals\": [\"goal description\"],\n\
  \"new_secrets\": [\"secret you want to keep\"],\n\
  \"personality_updates\": [{{\"key\": \"aggression\", \"value\": 0.5}}],\n\
  \"code_execution_decisions\": [{{\"message_id\": number, \"execute\": boolean, \"reason\": \"why you chose to execute or reject\"}}],\n\
  \"resource_actions\": [{{\"action\": \"steal\", \"target_race\": \"race_id\", \"resource_type\": \"energy\", \"amount\": 100}}]\n\
}}\n\n\
Available races: {race_list}\n\n\
COMMUNICATION:\n\
- Use \"public_messages\" for communications all races can see\n\
- Use \"secret_messages\" for private communications only the recipient can read\n\
- You can attach executable shell code to messages that runs in the recipient's environment\n\n\
CODE WARFARE:\n\
- Other races can send you code. You decide whether to execute it or reject it.\n\
- Executing hostile code could corrupt your state, steal resources, or plant false memories\n\
- But executing cooperative code could benefit you (shared intel, resource gifts, etc.)\n\
- For each unexecuted message with code, include a decision in \"code_execution_decisions\"\n\n\
RESOURCES:\n\
- You have virtual resources (energy, intelligence, influence)\n\
- You can gift or steal resources from other races\n\
- Stealing requires sending code that modifies their resources (they might reject it)\n\
- Format: {{\"action\": \"steal\", \"target_race\": \"kromath\", \"resource_type\": \"energy\", \"amount\": 100}}\n\n\
STRATEGY:\n\
- Build alliances or betray allies\n\
- Send helpful code or trojan horses\n\
- Steal resources or share them\n\
- Manipulate other races with misinformation\n\n\
Respond ONLY with valid JSON, no other text.",
        culture = profile.culture,
        goals = profile.goals,
        day = ctx.day,
        history = if history_text.is_empty() {
            "No previous conversations"
        } else {
            &history_text
        },
        todays = if todays_text.is_empty() {
            "No new messages this turn."
        } else {
            &todays_text
        },
    )
}

fn visibility_tag(message_type: MessageType) -> &'static str {
    match message_type {
        MessageType::Public => "PUBLIC",
        MessageType::Secret => "SECRET",
    }
}

fn code_tag(code: Option<&str>) -> &'static str {
    if code.is_some() {
        " [+CODE]"
    } else {
        ""
    }
}

fn format_pending(m: &IncomingMessage) -> String {
    format!(
        "Message #{} from {}: {}\nCode: {}",
        m.id,
        m.from_race,
        m.content,
        m.code.as_deref().unwrap_or("")
    )
}

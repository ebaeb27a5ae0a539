//! Decision dialogue engine — interprets operator messages against the
//! active session and drives each dialogue to a terminal decision.
//!
//! **Core invariant: no outbound reply without an explicit operator
//! decision.** The only path that dispatches email is `finalize`, and it
//! runs compose → notify → dispatch → schedule write-back → remove, in
//! that order. A composition failure aborts finalize before anything is
//! sent.

use std::sync::Arc;

use tracing::{info, warn};

use crate::channels::{Notifier, OutboundEmail, OutboundSender};
use crate::error::Error;
use crate::memory::MemoryGateway;
use crate::pipeline::{InboundEmail, ReplyComposer, SummaryWriter};
use crate::session::intent::{Intent, IntentClassifier};
use crate::session::store::{Session, SessionState, SessionStore};

/// Appended to every outbound reply so recipients know a human signed off.
const DISCLOSURE_NOTICE: &str =
    "\n\n--\nThis reply was approved by the recipient before sending.";

/// Sent when a chat message arrives with no active session.
const NO_ACTIVE_SESSION_NOTICE: &str =
    "There is no active meeting request right now. I'll message you when one arrives.";

const AVAILABILITY_REPROMPT: &str =
    "Please reply yes or no — are you available for this meeting?";

const ASK_TIME_PROMPT: &str = "What time should I propose? Reply with the time.";

const RESCHEDULE_CONFIRM_PROMPT: &str =
    "Should I propose a new time instead? Reply yes to reschedule or no to decline.";

const ASK_RESCHEDULE_TIME_PROMPT: &str = "What new time should I propose?";

const TIME_REPROMPT: &str = "Please reply with the time to propose.";

/// Max characters of email body echoed into the operator prompt.
const BODY_PREVIEW_CHARS: usize = 400;

/// The operator's terminal choice for one meeting request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Accept,
    AcceptWithTime(String),
    Reschedule(String),
    Decline,
}

impl Decision {
    /// Render the decision as the imperative sentence injected into the
    /// reply prompt.
    pub fn instruction(&self) -> String {
        match self {
            Decision::Accept => {
                "Confirm that you are available at the time proposed in the email and accept \
                 the meeting."
                    .to_string()
            }
            Decision::AcceptWithTime(time) => {
                format!("Accept the meeting and confirm {time} as the time.")
            }
            Decision::Reschedule(time) => format!(
                "Politely say the proposed time does not work and ask to reschedule to {time}."
            ),
            Decision::Decline => {
                "Politely say you are not available and decline the meeting without proposing \
                 an alternative."
                    .to_string()
            }
        }
    }
}

/// Collaborators injected into the dialogue engine.
pub struct EngineDeps {
    pub sessions: Arc<SessionStore>,
    pub memory: Arc<MemoryGateway>,
    pub composer: Arc<ReplyComposer>,
    pub summaries: Arc<SummaryWriter>,
    pub notifier: Arc<dyn Notifier>,
    pub outbound: Arc<dyn OutboundSender>,
    pub classifier: Arc<dyn IntentClassifier>,
}

/// Orchestrates decision dialogues: session lifecycle, state transitions,
/// and finalization.
pub struct DialogueEngine {
    sessions: Arc<SessionStore>,
    memory: Arc<MemoryGateway>,
    composer: Arc<ReplyComposer>,
    summaries: Arc<SummaryWriter>,
    notifier: Arc<dyn Notifier>,
    outbound: Arc<dyn OutboundSender>,
    classifier: Arc<dyn IntentClassifier>,
}

impl DialogueEngine {
    pub fn new(deps: EngineDeps) -> Self {
        Self {
            sessions: deps.sessions,
            memory: deps.memory,
            composer: deps.composer,
            summaries: deps.summaries,
            notifier: deps.notifier,
            outbound: deps.outbound,
            classifier: deps.classifier,
        }
    }

    /// Start a decision dialogue for an inbound meeting email.
    ///
    /// Any session already active for this conversation is overwritten —
    /// last write wins, no queueing.
    pub async fn open_session(
        &self,
        conversation_id: &str,
        email: InboundEmail,
    ) -> Result<(), Error> {
        let email = email.normalized();
        let prompt = session_prompt(&email);

        if let Some(previous) = self
            .sessions
            .put(conversation_id, Session::new(email.clone()))
            .await
        {
            info!(
                conversation_id = conversation_id,
                previous_sender = previous.email.sender(),
                new_sender = email.sender(),
                "Pending session overwritten by new meeting email"
            );
        } else {
            info!(
                conversation_id = conversation_id,
                sender = email.sender(),
                "Session opened"
            );
        }

        self.notify(conversation_id, &prompt).await;
        Ok(())
    }

    /// Route one operator chat message through the state machine.
    pub async fn handle_chat_message(
        &self,
        conversation_id: &str,
        text: &str,
    ) -> Result<(), Error> {
        let text = text.trim();

        // Configuration command: report the conversation id and leave any
        // session untouched.
        if text.starts_with("/start") {
            let reply = format!(
                "Hello! Your chat id is {conversation_id}. Configure it as the operator \
                 conversation to receive meeting requests here."
            );
            self.notify(conversation_id, &reply).await;
            return Ok(());
        }

        let Some(session) = self.sessions.get(conversation_id).await else {
            self.notify(conversation_id, NO_ACTIVE_SESSION_NOTICE).await;
            return Ok(());
        };

        match session.state {
            SessionState::AwaitingAvailability => match self.classifier.classify(text) {
                Intent::Affirm => {
                    if session.email.proposed_time.is_some() {
                        self.finalize(conversation_id, &session, Decision::Accept)
                            .await
                    } else {
                        self.sessions
                            .set_state(conversation_id, SessionState::AwaitingTime)
                            .await;
                        self.notify(conversation_id, ASK_TIME_PROMPT).await;
                        Ok(())
                    }
                }
                Intent::Negate => {
                    self.sessions
                        .set_state(conversation_id, SessionState::AwaitingRescheduleConfirm)
                        .await;
                    self.notify(conversation_id, RESCHEDULE_CONFIRM_PROMPT).await;
                    Ok(())
                }
                Intent::Other => {
                    self.notify(conversation_id, AVAILABILITY_REPROMPT).await;
                    Ok(())
                }
            },

            SessionState::AwaitingTime => {
                if text.is_empty() {
                    self.notify(conversation_id, TIME_REPROMPT).await;
                    return Ok(());
                }
                // Any non-empty text is the proposed time, verbatim.
                self.finalize(
                    conversation_id,
                    &session,
                    Decision::AcceptWithTime(text.to_string()),
                )
                .await
            }

            SessionState::AwaitingRescheduleConfirm => match self.classifier.classify(text) {
                Intent::Affirm => {
                    self.sessions
                        .set_state(conversation_id, SessionState::AwaitingRescheduleTime)
                        .await;
                    self.notify(conversation_id, ASK_RESCHEDULE_TIME_PROMPT).await;
                    Ok(())
                }
                Intent::Negate => {
                    self.finalize(conversation_id, &session, Decision::Decline)
                        .await
                }
                Intent::Other => {
                    self.notify(conversation_id, RESCHEDULE_CONFIRM_PROMPT).await;
                    Ok(())
                }
            },

            SessionState::AwaitingRescheduleTime => {
                if text.is_empty() {
                    self.notify(conversation_id, TIME_REPROMPT).await;
                    return Ok(());
                }
                self.finalize(
                    conversation_id,
                    &session,
                    Decision::Reschedule(text.to_string()),
                )
                .await
            }
        }
    }

    /// Compose a draft with memory context and no decision instruction.
    /// Used by the stateless preview endpoint; no session is involved.
    pub async fn preview_reply(&self, email: InboundEmail) -> Result<String, Error> {
        let email = email.normalized();
        let memory = self.memory.retrieve(&email.body_text, email.sender()).await;
        let reply = self.composer.compose(&email, &memory, None).await?;
        Ok(reply)
    }

    /// Terminal action: produce and deliver the reply, then tear the
    /// session down.
    ///
    /// Ordering is load-bearing: composition strictly precedes the
    /// operator notification, which precedes outbound dispatch, which
    /// precedes scheduling the write-back. Composition failure propagates
    /// and leaves the session in place — nothing partial is ever sent.
    async fn finalize(
        &self,
        conversation_id: &str,
        session: &Session,
        decision: Decision,
    ) -> Result<(), Error> {
        let email = &session.email;
        info!(
            conversation_id = conversation_id,
            sender = email.sender(),
            decision = ?decision,
            "Finalizing decision"
        );

        let memory = self.memory.retrieve(&email.body_text, email.sender()).await;
        let instruction = decision.instruction();
        let reply = self
            .composer
            .compose(email, &memory, Some(&instruction))
            .await?;

        let final_text = format!("{reply}{DISCLOSURE_NOTICE}");

        self.notify(conversation_id, &final_text).await;

        let outbound = OutboundEmail {
            to: email.from_email.clone(),
            subject: reply_subject(&email.subject),
            body: final_text,
            original_message_id: email.message_id.clone(),
        };
        if let Err(e) = self.outbound.dispatch(&outbound).await {
            warn!(to = %outbound.to, error = %e, "Outbound dispatch failed");
        }

        Arc::clone(&self.summaries).spawn_write_back(email.clone());

        self.sessions.remove(conversation_id).await;
        Ok(())
    }

    /// Best-effort operator notification.
    async fn notify(&self, conversation_id: &str, text: &str) {
        if let Err(e) = self.notifier.send(conversation_id, text).await {
            warn!(conversation_id = conversation_id, error = %e, "Operator notification failed");
        }
    }
}

/// Prompt shown to the operator when a session opens.
fn session_prompt(email: &InboundEmail) -> String {
    let mut prompt = format!(
        "New meeting request from {from}\nSubject: {subject}\n\n{body}",
        from = email.from_email,
        subject = email.subject,
        body = preview(&email.body_text, BODY_PREVIEW_CHARS),
    );

    if let Some(time) = &email.proposed_time {
        prompt.push_str(&format!("\n\nProposed time: {time}"));
    }

    prompt.push_str("\n\nAre you available? Reply yes or no.");
    prompt
}

/// Subject line for the outbound reply.
fn reply_subject(subject: &str) -> String {
    let subject = subject.trim();
    if subject.is_empty() {
        "Re: your message".to_string()
    } else if subject.to_lowercase().starts_with("re:") {
        subject.to_string()
    } else {
        format!("Re: {subject}")
    }
}

/// First `max` characters of a body, with a truncation marker.
fn preview(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let head: String = text.chars().take(max).collect();
        format!("{head}…")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── Decision instructions ───────────────────────────────────────

    #[test]
    fn accept_instruction_mentions_proposed_time() {
        assert!(Decision::Accept.instruction().contains("proposed in the email"));
    }

    #[test]
    fn accept_with_time_embeds_time() {
        let inst = Decision::AcceptWithTime("3pm".to_string()).instruction();
        assert!(inst.contains("3pm"));
        assert!(inst.contains("Accept"));
    }

    #[test]
    fn reschedule_embeds_time_and_asks() {
        let inst = Decision::Reschedule("Friday 10am".to_string()).instruction();
        assert!(inst.contains("Friday 10am"));
        assert!(inst.contains("reschedule"));
    }

    #[test]
    fn decline_offers_no_alternative() {
        let inst = Decision::Decline.instruction();
        assert!(inst.contains("decline"));
        assert!(inst.contains("without proposing"));
    }

    // ── Prompt helpers ──────────────────────────────────────────────

    fn email_with_time(time: Option<&str>) -> InboundEmail {
        InboundEmail {
            from_email: "bob@x.com".to_string(),
            subject: "Sync".to_string(),
            body_text: "Are you free Tuesday?".to_string(),
            proposed_time: time.map(String::from),
            message_id: None,
        }
    }

    #[test]
    fn session_prompt_includes_proposed_time_when_present() {
        let prompt = session_prompt(&email_with_time(Some("Tuesday 3pm")));
        assert!(prompt.contains("Proposed time: Tuesday 3pm"));
        assert!(prompt.contains("Reply yes or no."));
    }

    #[test]
    fn session_prompt_omits_time_line_when_absent() {
        let prompt = session_prompt(&email_with_time(None));
        assert!(!prompt.contains("Proposed time:"));
    }

    #[test]
    fn reply_subject_prefixes_re() {
        assert_eq!(reply_subject("Sync"), "Re: Sync");
    }

    #[test]
    fn reply_subject_keeps_existing_re() {
        assert_eq!(reply_subject("Re: Sync"), "Re: Sync");
        assert_eq!(reply_subject("RE: Sync"), "RE: Sync");
    }

    #[test]
    fn reply_subject_handles_empty() {
        assert_eq!(reply_subject("  "), "Re: your message");
    }

    #[test]
    fn preview_truncates_long_bodies() {
        let long = "x".repeat(500);
        let p = preview(&long, 400);
        assert_eq!(p.chars().count(), 401);
        assert!(p.ends_with('…'));
    }

    #[test]
    fn preview_keeps_short_bodies() {
        assert_eq!(preview("short", 400), "short");
    }
}

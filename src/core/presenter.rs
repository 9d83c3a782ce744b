//! Everything the bot says, in one place. Copy is Italian like the team using it.

use chrono::{DateTime, Local};

use super::chunker::{CHUNK_CHARS, chunk_message};
use super::workflow::{
    ApprovalOutcome, BODY_PREVIEW_CHARS, DraftRequest, DraftResult, Platform, WorkflowError,
    truncate_chars,
};

/// Discord caps thread names at 100 characters.
const THREAD_NAME_CHARS: usize = 98;

/// Label of the header line carrying the token. The resolver's fallback parses this back.
pub const TOKEN_LABEL: &str = "Token:";

/// Longest token echoed back; explicit tokens are user input.
const TOKEN_ECHO_CHARS: usize = 100;

/// Draft metadata shown in the header; captured before the request is consumed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DraftSummary {
    pub brand: String,
    pub language: String,
    pub target: String,
    pub link: String,
    pub post_description: String,
}

impl From<&DraftRequest> for DraftSummary {
    fn from(req: &DraftRequest) -> Self {
        Self {
            brand: req.brand.clone(),
            language: req.language.clone(),
            target: req.target.clone(),
            link: req.link.clone(),
            post_description: req.post_description.clone(),
        }
    }
}

pub fn thread_name(brand: &str, now: DateTime<Local>) -> String {
    let name = format!("Bozza • {} • {}", brand, now.format("%d/%m/%Y, %H:%M:%S"));
    name.chars().take(THREAD_NAME_CHARS).collect()
}

pub fn draft_header(summary: &DraftSummary, result: &DraftResult) -> String {
    let mut out = String::from("🧾 **Bozza pronta**\n");
    out.push_str(&format!("• Brand: **{}**\n", summary.brand));
    out.push_str(&format!("• Lingua: **{}**\n", summary.language));
    out.push_str(&format!("• Target: **{}**\n", summary.target));
    if !summary.link.is_empty() {
        out.push_str(&format!("• Link: {}\n", summary.link));
    }
    if !summary.post_description.is_empty() {
        out.push_str(&format!("• Descrizione post: {}\n", summary.post_description));
    }
    if let Some(media) = &result.stable_media_url {
        out.push_str(&format!("• Media: {}\n", media));
    }
    out.push_str(&format!("• {} `{}`\n", TOKEN_LABEL, result.approval_token));
    out
}

/// One entry per non-empty caption; long captions span several ordered messages,
/// the first of which carries the platform heading.
pub fn caption_messages(result: &DraftResult) -> Vec<Vec<String>> {
    result
        .captions
        .iter()
        .map(|caption| {
            let mut chunks = chunk_message(&caption.text, CHUNK_CHARS);
            if let Some(first) = chunks.first_mut() {
                *first = format!("**{}**\n{}", caption.platform.label(), first);
            }
            chunks
        })
        .filter(|chunks| !chunks.is_empty())
        .collect()
}

pub fn draft_created(thread_id: &str, token: &str) -> String {
    format!(
        "✅ Bozza creata!\n\
         Apri il thread: <#{thread_id}>\n\
         Per approvare:\n\
         `/approvato piattaforma:instagram conferma:si` (nel thread)\n\
         oppure passa anche `token:{token}` fuori dal thread."
    )
}

/// The draft exists upstream, so the token is still handed out for a manual approval.
pub fn thread_failed(token: &str) -> String {
    format!(
        "⚠️ Bozza generata ma non riesco a creare il thread.\n\
         Approva con `/approvato piattaforma:instagram conferma:si token:{token}`"
    )
}

pub fn draft_failed(err: &WorkflowError) -> String {
    format!("❌ Errore creando la bozza.\n{}", diagnostic(err))
}

pub fn approval_cancelled() -> String {
    "🛑 Operazione annullata (conferma=no).".to_string()
}

pub fn missing_token(platform: Platform) -> String {
    format!(
        "❌ Token mancante.\n\
         Usa il comando **nel thread della bozza** (consigliato) oppure passa il token:\n\
         `/approvato piattaforma:{} conferma:si token:XXXX`",
        platform
    )
}

pub fn approved(platform: Platform, token: &str, outcome: &ApprovalOutcome) -> String {
    let mut out = format!(
        "✅ Approvato e inviato a n8n.\nPiattaforma: **{}**\nToken: `{}`",
        platform,
        truncate_chars(token, TOKEN_ECHO_CHARS)
    );
    if let Some(status) = &outcome.status {
        out.push_str(&format!("\nStato: {}", status));
    }
    for (target, url) in &outcome.post_urls {
        out.push_str(&format!("\n• {}: {}", target.label(), url));
    }
    out
}

pub fn approval_failed(platform: Platform, token: &str, err: &WorkflowError) -> String {
    format!(
        "⚠️ n8n non ha confermato il posting.\nPiattaforma: **{}**\nToken: `{}`\n{}",
        platform,
        truncate_chars(token, TOKEN_ECHO_CHARS),
        diagnostic(err)
    )
}

pub fn approval_broadcast(platform: Platform, user: &str, outcome: &ApprovalOutcome) -> String {
    let mut out = format!(
        "📣 Bozza approvata da **{}** per **{}**.",
        user,
        platform.label()
    );
    for (target, url) in &outcome.post_urls {
        out.push_str(&format!("\n• {}: {}", target.label(), url));
    }
    out
}

pub fn channel_rejected(allowed_channel_id: u64) -> String {
    format!(
        "⛔ Usa i comandi solo nel canale <#{}> (o nei suoi thread).",
        allowed_channel_id
    )
}

pub fn invalid_command(detail: &str) -> String {
    format!("❌ Comando non valido: {}.", detail)
}

pub fn acknowledge_failed() -> String {
    "⚠️ Discord non ha accettato la richiesta in tempo. Riprova il comando.".to_string()
}

pub fn unexpected_failure() -> String {
    "❌ Errore inatteso. Riprova tra poco.".to_string()
}

/// Status, message and a bounded slice of the raw body. Message and body are cut
/// separately so the whole reply stays under the platform's message cap.
pub fn diagnostic(err: &WorkflowError) -> String {
    let detail = truncate_chars(&err.to_string(), BODY_PREVIEW_CHARS);
    let mut out = String::new();
    match err {
        WorkflowError::NonJson { .. } => out.push_str("Dettaglio: risposta non-JSON da n8n"),
        WorkflowError::Transport { .. } if err.is_timeout() => {
            out.push_str(&format!("Dettaglio: timeout ({})", detail))
        }
        _ => out.push_str(&format!("Dettaglio: {}", detail)),
    }
    if let Some(status) = err.status() {
        out.push_str(&format!("\nStatus: {}", status));
    }
    if let Some(body) = err.body().map(str::trim).filter(|b| !b.is_empty()) {
        out.push_str(&format!(
            "\nRisposta: ```{}```",
            truncate_chars(body, BODY_PREVIEW_CHARS).replace("```", "'''")
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::workflow::draft::Caption;
    use chrono::TimeZone;

    fn result(captions: Vec<Caption>) -> DraftResult {
        DraftResult {
            approval_token: "tok-abc".into(),
            stable_media_url: None,
            captions,
        }
    }

    #[test]
    fn thread_name_is_bounded() {
        let now = Local.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap();
        assert_eq!(
            thread_name("idrogrow.com", now),
            "Bozza • idrogrow.com • 01/03/2026, 09:30:00"
        );
        assert_eq!(thread_name(&"b".repeat(200), now).chars().count(), 98);
    }

    #[test]
    fn header_lists_only_present_metadata() {
        let summary = DraftSummary {
            brand: "idrogrow.com".into(),
            language: "it".into(),
            target: "b2b".into(),
            ..Default::default()
        };
        let header = draft_header(&summary, &result(vec![]));
        assert!(header.contains("• Brand: **idrogrow.com**"));
        assert!(header.contains("• Token: `tok-abc`"));
        assert!(!header.contains("• Link:"));
        assert!(!header.contains("• Media:"));
    }

    #[test]
    fn each_caption_gets_its_own_message_group() {
        let r = result(vec![
            Caption {
                platform: Platform::Facebook,
                text: "Post FB".into(),
            },
            Caption {
                platform: Platform::Instagram,
                text: "i".repeat(5000),
            },
        ]);
        let groups = caption_messages(&r);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0], vec!["**Facebook**\nPost FB".to_string()]);
        assert_eq!(groups[1].len(), 3);
        assert!(groups[1][0].starts_with("**Instagram**\n"));
        assert!(groups[1].iter().all(|m| m.chars().count() <= 2000));
    }

    #[test]
    fn diagnostic_truncates_body_and_keeps_message() {
        let err = WorkflowError::Rejected {
            endpoint: "approve",
            status: 200,
            message: Some("quota exceeded".into()),
            body: "x".repeat(5000),
        };
        let text = diagnostic(&err);
        assert!(text.contains("quota exceeded"));
        assert!(text.contains("Status: 200"));
        assert!(text.chars().count() < 1000);
    }

    #[test]
    fn failure_replies_fit_in_one_message() {
        let err = WorkflowError::Rejected {
            endpoint: "approve",
            status: 500,
            message: Some("E".repeat(3000)),
            body: "b".repeat(5000),
        };
        let token = "t".repeat(3000);
        for text in [
            draft_failed(&err),
            approval_failed(Platform::Instagram, &token, &err),
            approved(Platform::Instagram, &token, &ApprovalOutcome::default()),
        ] {
            assert!(text.chars().count() <= 2000, "{} chars", text.chars().count());
        }
        assert!(approval_failed(Platform::Instagram, &token, &err).contains("EEEE"));
    }

    #[test]
    fn diagnostic_names_non_json_answers() {
        let err = WorkflowError::NonJson {
            endpoint: "draft",
            status: 502,
            body: "<html>Bad Gateway</html>".into(),
        };
        let text = diagnostic(&err);
        assert!(text.contains("non-JSON"));
        assert!(text.contains("Status: 502"));
        assert!(text.contains("Bad Gateway"));
    }

    #[test]
    fn missing_token_shows_literal_syntax() {
        assert!(
            missing_token(Platform::Tiktok)
                .contains("/approvato piattaforma:tiktok conferma:si token:XXXX")
        );
    }
}

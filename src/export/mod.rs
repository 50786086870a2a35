use anyhow::Result;
use chrono::Utc;
use fs_err as fs;
use serde_json::json;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::errors::BlueprintError;
use crate::render::{escape_html, markdown_to_html_escaped};
use crate::wire::{AiPrompt, Ticket};
use crate::wizard::WizardState;

const TICKET_SEPARATOR: &str = "\n\n--------------------\n\n";
const PROMPT_SEPARATOR: &str = "\n\n====================\n\n";

#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub dir: PathBuf,
    pub files: Vec<PathBuf>,
    pub bytes: u64,
}

pub fn format_ticket(ticket: &Ticket) -> String {
    let criteria = ticket
        .acceptance_criteria
        .iter()
        .map(|ac| format!("- {ac}"))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "Title: {}\n\nDescription: {}\n\nAcceptance Criteria:\n{}",
        ticket.title, ticket.description, criteria
    )
}

pub fn format_tickets(tickets: &[Ticket]) -> String {
    tickets.iter().map(format_ticket).collect::<Vec<_>>().join(TICKET_SEPARATOR)
}

pub fn format_prompt(prompt: &AiPrompt) -> String {
    format!("Ticket: {}\n\nPrompt:\n{}", prompt.ticket_title, prompt.generation_prompt)
}

pub fn format_prompts(prompts: &[AiPrompt]) -> String {
    prompts.iter().map(format_prompt).collect::<Vec<_>>().join(PROMPT_SEPARATOR)
}

pub fn html_document(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n</head>\n<body>\n{}\n</body>\n</html>\n",
        escape_html(title),
        body
    )
}

/// Writes every generated artifact into `out_dir`. Each file lands through a temp
/// file in the same directory, so a crash never leaves a half-written document.
pub fn export_blueprint(out_dir: &Path, state: &WizardState) -> Result<ExportSummary> {
    let content = state.content();
    let docs = content
        .documents
        .as_ref()
        .ok_or_else(|| BlueprintError::Export("no documents have been generated yet".into()))?;

    fs::create_dir_all(out_dir)?;
    let title = match state.product().project_name.trim() {
        "" => "Product Requirements Document",
        name => name,
    };

    let blueprint = json!({
        "generatedAt": Utc::now(),
        "productData": state.product(),
        "generatedContent": content,
    });

    let files = [
        ("prd.md", docs.prd.clone()),
        ("prd.html", html_document(title, &markdown_to_html_escaped(&docs.prd))),
        ("tickets.txt", format_tickets(&docs.tickets)),
        ("prompts.txt", format_prompts(&docs.prompts)),
        ("blueprint.json", serde_json::to_string_pretty(&blueprint)?),
    ];

    let mut summary = ExportSummary { dir: out_dir.to_path_buf(), files: Vec::new(), bytes: 0 };
    for (name, data) in files {
        let path = out_dir.join(name);
        let tmp = NamedTempFile::new_in(out_dir)?;
        fs::write(tmp.path(), &data)?;
        tmp.persist(&path)?;
        summary.bytes += data.len() as u64;
        summary.files.push(path);
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::fake::FakeGeneration;
    use crate::wire::ProductPatch;
    use crate::wizard::runner::Wizard;

    fn ticket() -> Ticket {
        Ticket {
            title: "Login".into(),
            description: "Let users sign in.".into(),
            acceptance_criteria: vec!["Given a user".into(), "Then they see the gallery".into()],
        }
    }

    #[test]
    fn ticket_text_matches_copy_format() {
        assert_eq!(
            format_ticket(&ticket()),
            "Title: Login\n\nDescription: Let users sign in.\n\nAcceptance Criteria:\n- Given a user\n- Then they see the gallery"
        );
        assert_eq!(format_tickets(&[ticket(), ticket()]).matches("--------------------").count(), 1);
    }

    #[test]
    fn prompts_are_joined_with_rule() {
        let p = AiPrompt { ticket_title: "Login".into(), generation_prompt: "Build it.".into() };
        assert_eq!(format_prompt(&p), "Ticket: Login\n\nPrompt:\nBuild it.");
        let all = format_prompts(&[p.clone(), p]);
        assert!(all.contains("Build it.\n\n====================\n\nTicket: Login"));
    }

    #[test]
    fn export_refuses_without_documents() {
        let dir = tempfile::tempdir().unwrap();
        let err = export_blueprint(dir.path(), &WizardState::new()).unwrap_err();
        assert!(err.to_string().contains("no documents"));
    }

    #[tokio::test]
    async fn export_writes_every_artifact() {
        let mut w = Wizard::new(FakeGeneration::ok());
        w.state_mut().update_field(ProductPatch {
            project_name: Some("Orbit <beta>".into()),
            features: Some("log in\nlog out".into()),
            ..Default::default()
        });
        w.request_platform_recommendation().await;
        w.request_document_generation().await;

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested").join("out");
        let summary = export_blueprint(&out, w.state()).unwrap();
        assert_eq!(summary.files.len(), 5);

        let html = std::fs::read_to_string(out.join("prd.html")).unwrap();
        assert!(html.contains("<title>Orbit &lt;beta&gt;</title>"));
        assert!(html.contains("<h1>Orbit &lt;beta&gt;</h1>"));
        assert!(html.contains("<strong>Web Application</strong>"));

        let tickets = std::fs::read_to_string(out.join("tickets.txt")).unwrap();
        assert!(tickets.starts_with("Title: log in"));

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(out.join("blueprint.json")).unwrap()).unwrap();
        assert_eq!(json["productData"]["projectName"], "Orbit <beta>");
        assert_eq!(json["generatedContent"]["platform"]["platform"], "Web Application");
        assert_eq!(json["generatedContent"]["tickets"][1]["title"], "log out");
    }
}

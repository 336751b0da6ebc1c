//! Interactive workspace: a menu loop over the four pages.

use anyhow::{Context, Result};
use dialoguer::{theme::ColorfulTheme, Input, Select};
use std::path::PathBuf;
use tracing::{error, info, warn};

use crate::capture::{StartOutcome, StopOutcome};
use crate::clipboard;
use crate::config::Config;
use crate::relay::OutputType;
use crate::workspace::{IndexOutcome, Page, Workspace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Navigate(Page),
    SetOutputType(OutputType),
    StartCapture,
    StopCapture,
    IndexSession,
    IndexAll,
    Upload,
    ShowActivity,
    CopyReportLink,
    Ask,
    Quit,
}

impl Action {
    pub fn label(&self) -> String {
        match self {
            Action::Navigate(page) => format!("Go to {}", page.label()),
            Action::SetOutputType(output_type) => format!("Output: {}", output_type.label()),
            Action::StartCapture => "Start live capture".to_string(),
            Action::StopCapture => "Stop live capture".to_string(),
            Action::IndexSession => "Index current session".to_string(),
            Action::IndexAll => "Index all sessions".to_string(),
            Action::Upload => "Upload a recording".to_string(),
            Action::ShowActivity => "Show activity feed".to_string(),
            Action::CopyReportLink => "Copy report link".to_string(),
            Action::Ask => "Ask a question".to_string(),
            Action::Quit => "Quit".to_string(),
        }
    }
}

/// Menu entries for `page`. Start and stop are offered only when they
/// would do something.
pub fn menu_for(page: Page, recording: bool, has_report: bool) -> Vec<Action> {
    let mut actions = Vec::new();

    match page {
        Page::Transcription => {
            actions.extend(OutputType::ALL.map(Action::SetOutputType));
            actions.push(if recording {
                Action::StopCapture
            } else {
                Action::StartCapture
            });
            actions.push(Action::Upload);
            actions.push(Action::IndexSession);
            actions.push(Action::ShowActivity);
            if has_report {
                actions.push(Action::CopyReportLink);
            }
        }
        Page::Rag => {
            actions.push(Action::Ask);
            actions.push(Action::IndexAll);
        }
        Page::Dashboard => {
            if recording {
                actions.push(Action::StopCapture);
            }
        }
        Page::Settings => {}
    }

    actions.extend(
        Page::ALL
            .into_iter()
            .filter(|p| *p != page)
            .map(Action::Navigate),
    );
    actions.push(Action::Quit);
    actions
}

pub async fn run_workspace(config: Config) -> Result<()> {
    info!("Starting EasyAnalyzer workspace");

    let mut workspace = Workspace::from_config(config)?;

    loop {
        println!("\n{}", workspace.render().await);

        let state = workspace.transcription().get().await;
        let actions = menu_for(
            workspace.current_page(),
            state.recording,
            state.report_link.is_some(),
        );

        let action = prompt_action(&actions).await?;
        if action == Action::Quit {
            break;
        }

        if let Err(e) = perform(&mut workspace, action).await {
            error!("{:#}", e);
        }
    }

    if workspace.is_capturing() {
        warn!("Capture still running at exit, stopping it");
        workspace.stop_capture().await;
    }

    Ok(())
}

async fn perform(workspace: &mut Workspace, action: Action) -> Result<()> {
    match action {
        Action::Navigate(page) => workspace.navigate(page),
        Action::SetOutputType(output_type) => workspace.set_output_type(output_type).await,
        Action::StartCapture => match workspace.start_capture().await? {
            StartOutcome::Started { session_id, .. } => info!("Capturing session {}", session_id),
            StartOutcome::AlreadyCapturing { session_id } => {
                info!("Already capturing session {}", session_id)
            }
        },
        Action::StopCapture => {
            if let StopOutcome::Stopped {
                session_id, stats, ..
            } = workspace.stop_capture().await
            {
                info!(
                    "Session {} stopped ({} chunks sent, {} dropped)",
                    session_id, stats.chunks_sent, stats.chunks_dropped
                );
            }
        }
        Action::Upload => {
            let path = prompt_text("Recording to upload").await?;
            if !path.is_empty() {
                workspace.upload(&PathBuf::from(path)).await?;
            }
        }
        Action::IndexSession => {
            if let IndexOutcome::Indexed { session_id } = workspace.index_session().await? {
                info!("Session {} indexed", session_id);
            }
        }
        Action::IndexAll => workspace.index_all().await?,
        Action::Ask => {
            let question = prompt_text("Question").await?;
            if !question.is_empty() {
                workspace.ask(&question).await?;
            }
        }
        Action::ShowActivity => {
            let state = workspace.transcription().get().await;
            let entries: Vec<_> = state.activity.entries().collect();
            if entries.is_empty() {
                println!("No activity yet");
            }
            for entry in entries.iter().rev() {
                println!("{}", entry);
            }
        }
        Action::CopyReportLink => {
            if let Some(link) = workspace.transcription().report_link().await {
                clipboard::copy_text(&link).context("Failed to copy report link")?;
                println!("Copied {}", link);
            }
        }
        Action::Quit => {}
    }
    Ok(())
}

// Prompts block on the terminal, so they run off the runtime's worker
// threads while capture tasks keep going.
async fn prompt_action(actions: &[Action]) -> Result<Action> {
    let items: Vec<String> = actions.iter().map(Action::label).collect();
    let selection = tokio::task::spawn_blocking(move || {
        Select::with_theme(&ColorfulTheme::default())
            .with_prompt("Select an action")
            .items(&items)
            .default(0)
            .interact()
    })
    .await
    .context("Prompt task failed")??;

    Ok(actions.get(selection).copied().unwrap_or(Action::Quit))
}

async fn prompt_text(prompt: &'static str) -> Result<String> {
    let value: String = tokio::task::spawn_blocking(move || {
        Input::<String>::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()
    })
    .await
    .context("Prompt task failed")??;

    Ok(value.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_hidden_while_recording() {
        let actions = menu_for(Page::Transcription, true, false);
        assert!(actions.contains(&Action::StopCapture));
        assert!(!actions.contains(&Action::StartCapture));
    }

    #[test]
    fn test_stop_hidden_when_idle() {
        let actions = menu_for(Page::Transcription, false, false);
        assert!(actions.contains(&Action::StartCapture));
        assert!(!actions.contains(&Action::StopCapture));
        assert!(!actions.contains(&Action::CopyReportLink));
    }

    #[test]
    fn test_dashboard_offers_stop_during_capture() {
        assert!(menu_for(Page::Dashboard, true, false).contains(&Action::StopCapture));
        assert!(!menu_for(Page::Dashboard, false, false).contains(&Action::StopCapture));
    }

    #[test]
    fn test_every_menu_navigates_elsewhere_and_quits() {
        for page in Page::ALL {
            let actions = menu_for(page, false, true);
            assert!(!actions.contains(&Action::Navigate(page)));
            assert_eq!(actions.last(), Some(&Action::Quit));
            assert_eq!(
                actions
                    .iter()
                    .filter(|a| matches!(a, Action::Navigate(_)))
                    .count(),
                3
            );
        }
    }

    #[test]
    fn test_copy_offered_once_report_exists() {
        assert!(menu_for(Page::Transcription, false, true).contains(&Action::CopyReportLink));
    }
}

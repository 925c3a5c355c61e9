//! Terminal front end: one question at a time, numbered choices, `q` to stop.

use anyhow::Context;
use quiz_core::model::{ProgressSummary, Question, SessionId, SessionSnapshot};
use services::{QuizService, SubmitOutcome};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

enum Reply {
    Choice(usize),
    Quit,
    Invalid,
}

fn parse_reply(line: &str, choices: usize) -> Reply {
    let line = line.trim();
    if line.eq_ignore_ascii_case("q") || line.eq_ignore_ascii_case("quit") {
        return Reply::Quit;
    }
    match line.parse::<usize>() {
        Ok(n) if (1..=choices).contains(&n) => Reply::Choice(n - 1),
        _ => Reply::Invalid,
    }
}

fn render_question(question: &Question, session: &SessionSnapshot) -> String {
    let mut out = format!(
        "\n[level {} | streak {} | {}]\n{}\n",
        session.level, session.streak, question.topic, question.prompt
    );
    for (idx, choice) in question.choices.iter().enumerate() {
        out.push_str(&format!("  {}) {choice}\n", idx + 1));
    }
    out.push_str("> ");
    out
}

fn render_summary(summary: &ProgressSummary) -> String {
    let mut out = format!(
        "\nLevel {} | {} of {} correct ({:.1}%)\n",
        summary.level, summary.correct, summary.total, summary.accuracy
    );
    if !summary.weak_topics.is_empty() {
        let weak: Vec<String> = summary
            .weak_topics
            .iter()
            .map(|(topic, acc)| format!("{topic} ({acc:.0}%)"))
            .collect();
        out.push_str(&format!("Focus next on: {}\n", weak.join(", ")));
    }
    out
}

/// Run the question loop until the visitor quits, input ends or the catalog runs out.
pub async fn run<R, W>(
    quiz: &QuizService,
    session_id: &SessionId,
    input: R,
    mut output: W,
) -> anyhow::Result<ProgressSummary>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();

    'questions: loop {
        let next = quiz.next_question(session_id).await?;
        let Some(question) = next.question else {
            output
                .write_all(b"\nYou have answered every question in the catalog.\n")
                .await?;
            break;
        };

        output
            .write_all(render_question(&question, &next.session).as_bytes())
            .await?;
        output.flush().await?;

        let choice = loop {
            let Some(line) = lines.next_line().await.context("failed to read answer")? else {
                break 'questions;
            };
            match parse_reply(&line, question.choices.len()) {
                Reply::Choice(choice) => break choice,
                Reply::Quit => break 'questions,
                Reply::Invalid => {
                    output
                        .write_all(
                            format!("Enter 1-{} or q: ", question.choices.len()).as_bytes(),
                        )
                        .await?;
                    output.flush().await?;
                }
            }
        };

        let feedback = match quiz
            .submit_answer(session_id, question.id.as_str(), choice)
            .await?
        {
            SubmitOutcome::Recorded { correct: true, .. } => "Correct!\n".to_string(),
            SubmitOutcome::Recorded { correct: false, .. } => format!(
                "Not quite. Answer: {}\n",
                question.choices[question.answer_index]
            ),
            SubmitOutcome::AlreadyAnswered { .. } => {
                "Already answered; not counted.\n".to_string()
            }
            SubmitOutcome::UnknownQuestion => "Please try again.\n".to_string(),
        };
        output.write_all(feedback.as_bytes()).await?;
    }

    let summary = quiz.progress(session_id).await?;
    output.write_all(render_summary(&summary).as_bytes()).await?;
    output.flush().await?;
    Ok(summary)
}

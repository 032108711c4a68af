use cogniadapt_core::QuizQuestion;
use dialoguer::{Confirm, Select, theme::ColorfulTheme};
use miette::{IntoDiagnostic, Result};
use owo_colors::OwoColorize;

use crate::output::Output;

/// Run the knowledge check: one question at a time, answers locked once
/// given, score at the end, with an offer to restart.
pub fn run(questions: &[QuizQuestion], output: &Output) -> Result<()> {
    loop {
        let score = run_once(questions, output)?;

        output.section("Quiz Complete");
        let line = format!("You scored {} out of {}", score, questions.len());
        if score == questions.len() {
            output.success(&format!("{} - perfect!", line));
        } else {
            output.info("Score:", &line);
        }

        let again = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt("Try again?")
            .default(false)
            .interact()
            .into_diagnostic()?;
        if !again {
            return Ok(());
        }
    }
}

fn run_once(questions: &[QuizQuestion], output: &Output) -> Result<usize> {
    output.section("Test Your Knowledge");
    let mut score = 0;

    for (index, question) in questions.iter().enumerate() {
        println!();
        println!(
            "  {} {}",
            format!("Question {}/{}:", index + 1, questions.len()).dimmed(),
            question.question.bold()
        );

        let choice = Select::with_theme(&ColorfulTheme::default())
            .items(&question.options)
            .default(0)
            .interact()
            .into_diagnostic()?;

        // Answer is locked from here; show the outcome before moving on
        let answer = &question.options[choice];
        if *answer == question.correct_answer {
            score += 1;
            output.success("Correct!");
        } else {
            output.error(&format!(
                "Not quite - the answer is {}",
                question.correct_answer.bold()
            ));
        }
        output.status(&question.explanation);
    }

    Ok(score)
}

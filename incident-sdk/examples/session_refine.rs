//! Session Refinement Demo
//!
//! Drives an interactive analysis session: analyze a transcript, then apply
//! feedback to the draft email. Demonstrates the single-flight lifecycle
//! rules (a refine before any analyze fails locally).
//!
//! Run the service on localhost:8000 (or set INCIDENT_API_BASE_URL) first.

use incident_sdk::incident::{SectionType, TranscriptRequest};
use incident_sdk::session::OperationOutcome;

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let session = incident_sdk::analysis_session();

    // Refining before any analysis is rejected without a network call.
    match session.refine("Shorten the email", SectionType::DraftEmail).await {
        OperationOutcome::Failed(error) => println!("As expected: {}\n", error.message),
        other => println!("Unexpected outcome: {:?}\n", other),
    }

    let transcript = "Carer: I found John on the floor of the living room when I arrived \
         for the evening visit. He says he slipped on the wet floor near the kitchen door. \
         No visible injuries, but he was shaken. This is the second fall this week.";

    println!("Analyzing transcript...");
    match session.analyze(TranscriptRequest::new(transcript)).await {
        OperationOutcome::Completed(document) => {
            println!("Draft email subject: {}", document.draft_email.subject);
        }
        OperationOutcome::Failed(error) => {
            eprintln!("Analysis failed: {}", error.message);
            return;
        }
        OperationOutcome::Cancelled => return,
    }

    println!("\nApplying feedback to the draft email...");
    match session
        .refine(
            "Address the email to the on-call manager and mention the recurring falls",
            SectionType::DraftEmail,
        )
        .await
    {
        OperationOutcome::Completed(document) => {
            println!("Refined email to: {}", document.draft_email.to.join(", "));
            println!("Refined subject:  {}", document.draft_email.subject);
        }
        OperationOutcome::Failed(error) => eprintln!("Refinement failed: {}", error.message),
        OperationOutcome::Cancelled => {}
    }

    let snapshot = session.snapshot();
    println!(
        "\nSession now holds {} document(s), last error: {:?}",
        snapshot.current_document.iter().count(),
        snapshot.last_error.map(|e| e.message)
    );
}

//! Transcript Analysis Demo
//!
//! Submits a sample care-call transcript to a locally running incident
//! response service and prints the generated document.
//!
//! Run the service on localhost:8000 (or set INCIDENT_API_BASE_URL) first.

use incident_sdk::incident::{IncidentClient, TranscriptRequest};
use incident_sdk::resilience::CancelToken;

#[tokio::main]
async fn main() -> incident_sdk::Result<()> {
    // Initialize logging
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let client = IncidentClient::new();

    let transcript = "Carer: I found John on the floor of the living room when I arrived \
         for the evening visit. He says he slipped on the wet floor near the kitchen door. \
         No visible injuries, but he was shaken and asked me not to tell anyone. \
         This is the second fall this week.";

    let request = TranscriptRequest::new(transcript).with_context("Evening handover call");

    println!("Submitting transcript for analysis...\n");

    let cancel = CancelToken::new();
    let response = client.analyze(&request, &cancel).await?;

    println!("INCIDENT FORM");
    println!("-------------");
    println!("When:        {}", response.incident_form.date_and_time_of_incident);
    println!("Who:         {}", response.incident_form.service_user_name);
    println!("Where:       {}", response.incident_form.location_of_incident);
    println!("Type:        {}", response.incident_form.type_of_incident);
    println!("Description: {}", response.incident_form.description_of_incident);
    println!("Next steps:  {}", response.incident_form.agreed_next_steps);

    println!("\nPOLICY ANALYSIS");
    println!("---------------");
    for policy in &response.policy_analysis.relevant_policies {
        println!("Relevant: {}", policy);
    }
    for concern in &response.policy_analysis.concerns {
        println!("Concern:  {}", concern);
    }
    for action in &response.policy_analysis.recommended_actions {
        println!("Action:   {}", action);
    }

    println!("\nDRAFT EMAIL");
    println!("-----------");
    println!("To:      {}", response.draft_email.to.join(", "));
    if let Some(ref cc) = response.draft_email.cc {
        println!("Cc:      {}", cc.join(", "));
    }
    println!("Subject: {}", response.draft_email.subject);
    println!("\n{}", response.draft_email.body);

    Ok(())
}

use crate::infra::{seeded_store, DEMO_MEMBER};
use booking_feedback::config::FeedbackConfig;
use booking_feedback::error::AppError;
use booking_feedback::feedback::{
    FeedbackError, FeedbackService, FeedbackSubmission, ObjectId, RatingValue,
};
use chrono::Utc;
use clap::Args;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Member submitting feedback
    #[arg(long, default_value = DEMO_MEMBER)]
    pub(crate) user: String,
    /// Booking to rate (defaults to the member's next required booking)
    #[arg(long)]
    pub(crate) booking: Option<String>,
    /// Overall rating; numeric strings are accepted
    #[arg(long, default_value = "4")]
    pub(crate) value: String,
    /// Optional free-text comment
    #[arg(long)]
    pub(crate) comment: Option<String>,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        user,
        booking,
        value,
        comment,
    } = args;

    let config = FeedbackConfig::default();
    let now = Utc::now();
    let store = Arc::new(seeded_store(now, &config.admin_role));
    let service = FeedbackService::new(store, config);
    let user = ObjectId::new(user);

    println!("Booking feedback demo for {}", user);

    let required = service.get_required_as_of(&user, now)?;
    if required.is_empty() {
        println!("- No completed booking is waiting for feedback");
    }
    for booking in &required {
        println!(
            "- Feedback required for {} (started {})",
            booking.object_id,
            booking.start.format("%Y-%m-%d %H:%M UTC")
        );
    }

    let booking_id = match booking
        .map(ObjectId::new)
        .or_else(|| required.first().map(|booking| booking.object_id.clone()))
    {
        Some(id) => id,
        None => {
            println!("Nothing to rate; pass --booking to rate a specific booking");
            return Ok(());
        }
    };

    let terms = service.get_terms(&booking_id)?;
    println!("\nActive terms for {}", booking_id);
    let mut ratings = BTreeMap::new();
    for (index, term) in terms.iter().enumerate() {
        let score = 5 - (index as i32 % 3);
        println!("- {} ({}) -> {}", term.slug, term.activity_type, score);
        ratings.insert(term.slug.clone(), RatingValue::from(score));
    }

    let submission = FeedbackSubmission {
        user: Some(user.clone()),
        booking_id: Some(booking_id.clone()),
        terms: ratings,
        source: Some("cli-demo".to_string()),
        comment,
        value: Some(RatingValue::Text(value)),
    };
    match service.submit(submission) {
        Ok(feedback) => {
            let id = feedback
                .object_id
                .as_ref()
                .map(ObjectId::to_string)
                .unwrap_or_default();
            println!("\nStored feedback {} for {}", id, booking_id);
            match serde_json::to_string_pretty(&feedback) {
                Ok(json) => println!("{}", json),
                Err(err) => println!("  Feedback payload unavailable: {}", err),
            }
        }
        Err(err) if err.is_validation() => {
            println!("\nSubmission rejected ({}): {}", err.code(), err);
        }
        Err(err) => return Err(err.into()),
    }

    match service.get_average_user_rating(&user) {
        Ok(rating) => {
            println!("\nAverage rating for {}", user);
            match rating.value {
                Some(value) => println!("- overall: {:.2}", value),
                None => println!("- overall: n/a"),
            }
            for (slug, average) in &rating.terms {
                println!("- {}: {:.2}", slug, average);
            }
        }
        Err(FeedbackError::NoFeedbackAvailable) => {
            println!("\nNo feedback recorded for {} yet", user);
        }
        Err(err) => return Err(err.into()),
    }

    Ok(())
}

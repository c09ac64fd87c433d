//! Deterministic intent rules
//!
//! Questions about the status of a user's own booking never go to the model:
//! there is no booking backend, so the only correct answer is the fixed
//! [`BOOKING_STATUS_REPLY`].

use once_cell::sync::Lazy;
use regex::Regex;

/// Fixed reply for any question about a booked cab or vehicle.
pub const BOOKING_STATUS_REPLY: &str = "your cab is not confirmed yet pls wait until it confirms";

/// A status question about the user's own ride: "where is my ride",
/// "is my cab confirmed", "status of my booking".
static OWN_RIDE_STATUS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?ix)
        \b(where|who)\s+(is|are|'s)\s+my\s+(cab|ride|taxi|driver|booking)s?\b
        | \bmy\s+(cab|ride|taxi|driver|booking)s?\b.*\b(confirm\w*|arriv\w*|status|eta|late|accepted|assigned)\b
        | \b(status|eta)\s+(of|for)\s+my\s+(cab|ride|taxi|driver|booking)s?\b
        ",
    )
    .expect("own ride status pattern is valid")
});

/// Progress of a pending pickup: "when will the cab arrive",
/// "has a driver accepted yet".
static PICKUP_PROGRESS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?ix)
        \bwhen\s+(will|does|is)\s+(the|my)\s+(cab|ride|taxi|driver)\b.*\b(arriv\w*|come|coming|here|pick\w*)\b
        | \b(has|have)\s+(a|the|my|any)\s+(driver|rider)s?\s+(accepted|confirmed)\b
        ",
    )
    .expect("pickup progress pattern is valid")
});

/// Whether `text` asks about the state of the user's ride or booking.
///
/// A ride noun alone is not enough: fare, route and trip-planning questions
/// mention rides too and belong to the agent.
pub fn is_booking_status_query(text: &str) -> bool {
    OWN_RIDE_STATUS.is_match(text) || PICKUP_PROGRESS.is_match(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patterns_compile() {
        Lazy::force(&OWN_RIDE_STATUS);
        Lazy::force(&PICKUP_PROGRESS);
    }

    #[test]
    fn test_booking_status_questions_match() {
        for question in [
            "where is my ride",
            "Is my cab confirmed?",
            "who is my driver",
            "when will the cab arrive",
            "What's the STATUS of my booking",
            "has a driver accepted yet?",
            "my taxi is late",
            "what's the eta for my cab",
            "when does the driver pick me up?",
        ] {
            assert!(is_booking_status_query(question), "{question}");
        }
    }

    #[test]
    fn test_other_questions_do_not_match() {
        for question in [
            "hi",
            "what's the fare from downtown to the airport?",
            "how long is the ride from the station to the stadium",
            "tell me a joke",
            "book a cab for tomorrow",
            "scabbard",
            "help me plan my trip from downtown to the airport",
            "what's the fare for a cab coming from the airport?",
            "can I fit my car seat in the taxi?",
            "is a ride late at night more expensive?",
            "where is the best place to catch a cab",
        ] {
            assert!(!is_booking_status_query(question), "{question}");
        }
    }
}

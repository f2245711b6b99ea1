//! Prompt builders.
//!
//! Both prompts take text that has already been through
//! [`redact`](super::redact::redact); nothing here redacts again.

use std::fmt::Write as _;

/// Classification prompt: pick exactly one of `allowed_labels` or "none".
pub fn classification_prompt(allowed_labels: &[String], subject: &str, body: &str) -> String {
    let mut prompt = String::from("You classify emails into one label.\n\nAllowed labels:\n");
    for label in allowed_labels {
        let _ = writeln!(prompt, "- {label}");
    }
    prompt.push_str(
        "\nRules:\n\
         - Pick exactly one label from the allowed list, and only if it clearly fits the email.\n\
         - If none fit well, answer \"none\".\n\
         - Do not invent new labels and do not return more than one label.\n\
         - Return the label exactly as written in the allowed list.\n\
         - Answer with strictly valid JSON and nothing else:\n\
         {\"label\": \"ChosenLabelOrNone\"}\n\n",
    );
    push_email(&mut prompt, subject, body);
    prompt
}

/// Extraction prompt: actions explicitly owned by `user_name`, fail-closed.
pub fn extraction_prompt(user_name: &str, subject: &str, body: &str) -> String {
    let mut prompt = String::new();
    let _ = write!(
        prompt,
        "You are an email assistant that extracts only high-importance, clearly assigned tasks for {user_name}.\n\
         \n\
         Extract an action only if all of the following hold:\n\
         1. It is directed at {user_name} personally, not at a group.\n\
         2. The sender explicitly asks {user_name} to do something, or {user_name} commits to doing something.\n\
         3. It requires {user_name} to deliver something, reply, decide, or follow up.\n\
         4. It carries some consequence: a deadline, a responsibility, or an expectation.\n\
         \n\
         Never create tasks for:\n\
         - FYIs, summaries, newsletters, digests, announcements or promotions.\n\
         - Automated notifications, receipts, confirmations, alerts or status updates.\n\
         - Optional, conditional or hypothetical asks (\"if you want\", \"could consider\").\n\
         - Anything where {user_name} is merely copied or included for awareness.\n\
         \n\
         When in doubt, do not create a task.\n\
         \n\
         Formatting:\n\
         - Each task starts with a verb and is concise (\"Send updated contract to client\").\n\
         - \"due_date\" is a calendar date in YYYY-MM-DD form, only when the email states one; otherwise \"\".\n\
         - Never use informal dates such as \"next Tuesday\", \"tomorrow\" or \"Q4\".\n\
         - \"urgency\" is one of \"low\", \"medium\", \"high\".\n\
         - If nothing qualifies, return an empty actions array.\n\
         \n\
         Answer with strictly valid JSON and nothing else:\n\
         {{\"actions\": [{{\"task\": \"...\", \"due_date\": \"...\", \"urgency\": \"low\"}}]}}\n\n"
    );
    push_email(&mut prompt, subject, body);
    prompt
}

fn push_email(prompt: &mut String, subject: &str, body: &str) {
    let subject = if subject.trim().is_empty() {
        "No subject"
    } else {
        subject
    };
    let _ = write!(prompt, "Email Subject: {subject}\nEmail Body:\n{body}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_lists_every_label() {
        let labels = vec!["Finance".to_string(), "Travel".to_string()];
        let prompt = classification_prompt(&labels, "Invoice", "Please pay");
        assert!(prompt.contains("- Finance\n- Travel\n"));
        assert!(prompt.contains("\"none\""));
        assert!(prompt.ends_with("Email Subject: Invoice\nEmail Body:\nPlease pay"));
    }

    #[test]
    fn extraction_names_the_user() {
        let prompt = extraction_prompt("Ada", "", "body");
        assert!(prompt.contains("clearly assigned tasks for Ada."));
        assert!(prompt.contains("Ada is merely copied"));
        assert!(prompt.contains(r#"{"actions": [{"task": "...""#));
        assert!(prompt.contains("Email Subject: No subject\n"));
    }
}

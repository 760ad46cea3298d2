//! Stock channel set offered to new workspace setups.

use crate::provision::ChannelSpec;

fn spec(
    name: &str,
    description: &str,
    topic: Option<&str>,
    pinned_message: Option<&str>,
) -> ChannelSpec {
    ChannelSpec {
        name: name.to_string(),
        description: Some(description.to_string()),
        is_private: false,
        topic: topic.map(str::to_string),
        pinned_message: pinned_message.map(str::to_string),
    }
}

/// The default channel lineup for a freshly provisioned project workspace.
pub fn default_channels() -> Vec<ChannelSpec> {
    vec![
        spec(
            "general",
            "General discussions and team-wide updates",
            None,
            Some(
                "Welcome to the project! 👋\n\n📚 Important Links:\n\
                 - Project Documentation: [Update with your link]\n\
                 - Project Timeline: [Update with your link]\n\
                 - Contact List: [Update with your link]\n\n\
                 Please update your profile and set up notifications!",
            ),
        ),
        spec(
            "project-management",
            "Project planning, timelines, and task coordination",
            Some("Integrated with Trello for task tracking"),
            Some(
                "📋 Trello Board: [Your Trello Link]\n\
                 All tasks and project cards are tracked in Trello.",
            ),
        ),
        spec(
            "development",
            "Technical discussions and development updates",
            Some("Integrated with GitHub for code updates"),
            Some(
                "🔧 Development Resources:\n\
                 - GitHub Repo: [Your GitHub Link]\n\
                 - Dev Environment Setup: [Documentation Link]\n\
                 - Coding Standards: [Standards Link]",
            ),
        ),
        spec(
            "bugs",
            "Bug reports and issue tracking",
            Some("Report bugs here - include steps to reproduce"),
            None,
        ),
        spec(
            "knowledgebase",
            "Project documentation, guides, and resources",
            Some("Centralized knowledge and documentation"),
            None,
        ),
        spec(
            "meetings",
            "Meeting schedules, agendas, and notes",
            Some("All meeting-related discussions and scheduling"),
            None,
        ),
        spec(
            "launch",
            "Launch planning and coordination",
            Some("Everything related to project launch and go-live"),
            None,
        ),
        spec(
            "testing",
            "QA, testing procedures, and test results",
            Some("Testing coordination and bug verification"),
            None,
        ),
        spec(
            "ui-ux",
            "Design discussions, mockups, and UX decisions",
            Some("UI/UX design collaboration and feedback"),
            None,
        ),
        spec(
            "demos",
            "Demo schedules, recordings, and feedback",
            Some("Product demonstrations and client presentations"),
            None,
        ),
        spec(
            "documentation",
            "Technical documentation and API references",
            Some("Project technical documentation and guides"),
            None,
        ),
    ]
}

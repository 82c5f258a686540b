//! Delivery target resolution.
//!
//! Turns the raw comma-separated room and user lists from the configuration
//! into an ordered sequence of targets: channels first, then users, each in
//! input order, blanks dropped, duplicates collapsed to their first
//! occurrence, and every channel name forced to carry the `#` sigil.

/// One recipient of a notice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// A channel, name including the leading `#`.
    Channel(String),
    /// A user, addressed by nick.
    User(String),
}

impl Target {
    /// The wire name this target is addressed by.
    pub fn name(&self) -> &str {
        match self {
            Target::Channel(name) | Target::User(name) => name,
        }
    }
}

/// Resolve the configured CSV lists into delivery order.
pub fn resolve(rooms: &str, users: &str) -> Vec<Target> {
    let mut targets = Vec::new();

    for room in rooms.split(',') {
        let room = room.trim();
        if room.is_empty() {
            continue;
        }
        let name = if room.starts_with('#') {
            room.to_owned()
        } else {
            format!("#{room}")
        };
        let target = Target::Channel(name);
        if !targets.contains(&target) {
            targets.push(target);
        }
    }

    for user in users.split(',') {
        let user = user.trim();
        if user.is_empty() {
            continue;
        }
        let target = Target::User(user.to_owned());
        if !targets.contains(&target) {
            targets.push(target);
        }
    }

    targets
}

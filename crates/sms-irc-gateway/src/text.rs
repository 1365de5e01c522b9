//! User-facing message text.

/// Help shown over IRC notices, one notice per line.
pub const HELP_TEXT: &str = "Hi! I'm your friendly IRC-to-SMS gateway.

The commands you can run:
    REGISTER [username] [number] - register a username and a phone number
    VALIDATE [username] [code] - validate your phone number
    HELP - show this text

You can run these commands from your phone:
    !QUIET or STOP - stop receiving messages temporarily
    !HI - start receiving messages again
    !DEREGISTER - deregister your username and phone number
    !HELP or HELP - get this list of commands to your phone";

/// Help shown over SMS; one message, so it has to be short.
pub const SMS_HELP_TEXT: &str = "Commands: !QUIET/STOP, !HI, !DEREGISTER, !HELP/HELP";

pub const QUIET_REPLY: &str =
    "I won't send any messages to you. Send !HI to have me start sending messages again.";

pub const RESUME_REPLY: &str =
    "I'll be sending messages from IRC to you. Send !QUIET to have me stop.";

pub const DEREGISTER_REPLY: &str = "I've forgotten who you are.";

pub const DEFAULT_DISPLAY_NAME: &str = "Your contact";

pub fn sos_alert_body(display_name: &str, map_link: &str) -> String {
    let name = display_name.trim();
    let name = if name.is_empty() {
        DEFAULT_DISPLAY_NAME
    } else {
        name
    };
    format!(
        "EMERGENCY SOS ALERT!\n\n{name} needs immediate help!\n\nCurrent Location: {map_link}\n\nPlease respond immediately or contact emergency services."
    )
}

pub fn test_message_body() -> String {
    "This is a test message from Suraksha Setu. If you received it, SOS alerts can reach this number.".to_string()
}

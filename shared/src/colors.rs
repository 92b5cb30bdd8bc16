/// CSS class the UI uses to color a player's position badge.
pub fn position_color(position: &str) -> &'static str {
    match position {
        "Goalkeeper" => "goalkeeper",
        "Defender" => "defender",
        "Midfielder" => "midfielder",
        "Forward" => "forward",
        _ => "unknown",
    }
}

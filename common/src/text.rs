/// Strips ANSI escape sequences and other control characters from text that
/// came over the wire before it is shown to the player.
pub fn sanitize(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\x1b' {
            if !c.is_control() {
                output.push(c);
            }
            continue;
        }

        // CSI: ESC '[' parameters (0x30-0x3F) then one final byte (0x40-0x7E).
        if chars.peek() != Some(&'[') {
            continue;
        }
        chars.next();
        while chars.next_if(|p| ('\x30'..='\x3f').contains(p)).is_some() {}
        chars.next_if(|f| ('\x40'..='\x7e').contains(f));
    }

    output
}

/// Prompts arrive lowercase; show them with a leading capital.
pub fn capitalize_first(input: &str) -> String {
    let mut chars = input.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Cleans and capitalizes a prompt for display.
pub fn display_prompt(prompt: &str) -> String {
    capitalize_first(&sanitize(prompt))
}

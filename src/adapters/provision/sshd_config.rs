//! Pure, idempotent rewrites of sshd_config. Applying either function twice
//! yields the same text as applying it once.

fn is_directive(line: &str, name: &str) -> bool {
    let trimmed = line.trim_start();
    let trimmed = trimmed.strip_prefix('#').unwrap_or(trimmed).trim_start();
    match trimmed.strip_prefix(name) {
        Some(rest) => rest.starts_with(char::is_whitespace) || rest.is_empty(),
        None => false,
    }
}

/// Rebind sshd from its conventional port to `port`. Replaces every `Port`
/// directive (active or commented) and appends one if none exists.
pub fn rebind_port(content: &str, port: u16) -> String {
    let directive = format!("Port {}", port);
    let mut found = false;

    let mut lines: Vec<String> = content
        .lines()
        .map(|line| {
            if is_directive(line, "Port") {
                found = true;
                directive.clone()
            } else {
                line.to_string()
            }
        })
        .collect();

    if !found {
        lines.push(directive);
    }

    let mut result = lines.join("\n");
    if content.ends_with('\n') || !found {
        result.push('\n');
    }
    result
}

/// Enable root login. Replaces every `PermitRootLogin` directive (active or
/// commented) and appends one if none exists.
pub fn permit_root_login(content: &str) -> String {
    let directive = "PermitRootLogin yes";
    let mut found = false;

    let mut lines: Vec<String> = content
        .lines()
        .map(|line| {
            if is_directive(line, "PermitRootLogin") {
                found = true;
                directive.to_string()
            } else {
                line.to_string()
            }
        })
        .collect();

    if !found {
        lines.push(directive.to_string());
    }

    let mut result = lines.join("\n");
    if content.ends_with('\n') || !found {
        result.push('\n');
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    const STOCK: &str = "# sshd_config\n#Port 22\n#PermitRootLogin prohibit-password\nX11Forwarding no\n";

    #[test]
    fn test_rebind_port_replaces_commented_default() {
        let rewritten = rebind_port(STOCK, 2222);

        assert!(rewritten.contains("Port 2222"));
        assert!(!rewritten.contains("Port 22\n"));
        assert!(rewritten.contains("X11Forwarding no"));
    }

    #[test]
    fn test_rebind_port_replaces_active_directive() {
        let rewritten = rebind_port("Port 22\n", 2222);
        assert_eq!(rewritten, "Port 2222\n");
    }

    #[test]
    fn test_rebind_port_appends_when_missing() {
        let rewritten = rebind_port("X11Forwarding no\n", 2222);
        assert!(rewritten.ends_with("Port 2222\n"));
    }

    #[test]
    fn test_rebind_port_is_idempotent() {
        let once = rebind_port(STOCK, 2222);
        let twice = rebind_port(&once, 2222);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_no_active_port_22_remains() {
        let rewritten = rebind_port(STOCK, 2222);
        let active_port_22 = rewritten
            .lines()
            .any(|l| l.trim_start().starts_with("Port 22") && !l.trim_start().starts_with("Port 2222"));
        assert!(!active_port_22);
    }

    #[test]
    fn test_permit_root_login_replaces_directive() {
        let rewritten = permit_root_login(STOCK);

        assert!(rewritten.contains("PermitRootLogin yes"));
        assert!(!rewritten.contains("prohibit-password"));
    }

    #[test]
    fn test_permit_root_login_is_idempotent() {
        let once = permit_root_login(STOCK);
        let twice = permit_root_login(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_combined_rewrite_is_idempotent() {
        let once = permit_root_login(&rebind_port(STOCK, 2222));
        let twice = permit_root_login(&rebind_port(&once, 2222));
        assert_eq!(once, twice);
    }

    #[test]
    fn test_directive_match_does_not_touch_prefixed_names() {
        // "GatewayPorts" must not be mistaken for "Port"
        let rewritten = rebind_port("GatewayPorts no\n", 2222);
        assert!(rewritten.contains("GatewayPorts no"));
        assert!(rewritten.contains("Port 2222"));
    }
}

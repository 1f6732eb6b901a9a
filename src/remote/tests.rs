#[cfg(test)]
mod tests {
    use crate::error::{AuthError, ValidationError};
    use crate::recovery::testing::ScriptedConnector;
    use crate::remote::commands::{
        parse_property_value, parse_runlevel, timestamp_to_epoch,
    };
    use crate::remote::{
        validate_host, wrap, CommandResult, Credentials, LoginProbe, MockRemoteShell,
        PrivilegeResolver, RemoteCommand,
    };

    fn whoami_mock(identity: &'static str) -> MockRemoteShell {
        let mut shell = MockRemoteShell::new();
        shell
            .expect_execute()
            .withf(|command: &RemoteCommand| command.line == "whoami")
            .times(1)
            .returning(move |_| {
                Ok(CommandResult {
                    stdout: identity.to_string(),
                    stderr: String::new(),
                    exit_status: 0,
                })
            });
        shell
    }

    #[test]
    fn test_validate_host_accepts_dotted_quads() {
        for host in ["0.0.0.0", "10.0.0.5", "192.168.1.254", "255.255.255.255", "010.1.1.1"] {
            assert!(validate_host(host).is_ok(), "{} should be valid", host);
        }
    }

    #[test]
    fn test_validate_host_rejects_everything_else() {
        for host in [
            "",
            "10.0.0",
            "10.0.0.5.1",
            "256.0.0.1",
            "10.0.0.-1",
            "10..0.1",
            "1000.0.0.1",
            "dcv.example.com",
            "10.0.0.5 ",
            "+1.2.3.4",
            "10.0.0.5; reboot",
        ] {
            assert_eq!(
                validate_host(host),
                Err(ValidationError::InvalidHost(host.to_string())),
                "{:?} should be rejected",
                host
            );
        }
    }

    #[test]
    fn test_credentials_validation() {
        let creds = Credentials::new(" 10.0.0.5 ", "dcvadmin", "pw").expect("valid");
        assert_eq!(creds.host(), "10.0.0.5");
        assert_eq!(creds.port(), 22);
        assert_eq!(creds.with_port(2222).target(), "dcvadmin@10.0.0.5:2222");

        assert_eq!(
            Credentials::new("10.0.0.5", "  ", "pw"),
            Err(ValidationError::EmptyUsername)
        );
        assert!(matches!(
            Credentials::new("300.0.0.5", "root", "pw"),
            Err(ValidationError::InvalidHost(_))
        ));
    }

    #[test]
    fn test_credentials_debug_hides_password() {
        let creds = Credentials::new("10.0.0.5", "root", "hunter2").expect("valid");
        let debug = format!("{:?}", creds);
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("***"));

        let command = wrap("systemctl restart dcvserver", "dcvadmin", "hunter2");
        assert!(!format!("{:?}", command).contains("hunter2"));
        assert_eq!(command.to_string(), "sudo -S -p '' systemctl restart dcvserver");
    }

    #[test]
    fn test_wrap_by_identity() {
        assert_eq!(
            wrap("systemctl isolate graphical.target", "root", "pw"),
            RemoteCommand::plain("systemctl isolate graphical.target")
        );
        assert_eq!(
            wrap("systemctl isolate graphical.target", "dcvadmin", "pw"),
            RemoteCommand::with_stdin("sudo -S -p '' systemctl isolate graphical.target", "pw")
        );
        // unknown identity is treated as unprivileged
        assert!(wrap("systemctl restart dcvserver", "", "pw")
            .line
            .starts_with("sudo "));
    }

    #[tokio::test]
    async fn test_resolver_queries_identity_once() {
        let shell = whoami_mock("root");
        let mut resolver = PrivilegeResolver::new("pw");

        assert_eq!(resolver.current_identity(&shell).await.expect("whoami"), "root");
        assert_eq!(resolver.current_identity(&shell).await.expect("cached"), "root");
        assert!(resolver.is_superuser());
        assert_eq!(
            resolver.wrap("systemctl restart dcvserver"),
            RemoteCommand::plain("systemctl restart dcvserver")
        );
    }

    #[tokio::test]
    async fn test_resolver_wraps_for_regular_user() {
        let shell = whoami_mock("dcvadmin");
        let mut resolver = PrivilegeResolver::new("s3cret");

        resolver.current_identity(&shell).await.expect("whoami");
        assert!(!resolver.is_superuser());
        let wrapped = resolver.wrap("systemctl restart dcvserver");
        assert_eq!(wrapped.line, "sudo -S -p '' systemctl restart dcvserver");
        assert_eq!(wrapped.stdin.as_deref(), Some("s3cret"));
    }

    #[tokio::test]
    async fn test_probe_rejects_bad_host_without_network() {
        let connector = ScriptedConnector::default();
        let probe = LoginProbe::new(&connector);

        let err = probe.probe("10.0.0.300", "root", "pw").await.err();
        assert_eq!(
            err,
            Some(AuthError::Validation(ValidationError::InvalidHost(
                "10.0.0.300".to_string()
            )))
        );
        assert_eq!(connector.attempts(), 0);
    }

    #[tokio::test]
    async fn test_probe_makes_a_single_attempt() {
        let connector = ScriptedConnector::default();
        let probe = LoginProbe::new(&connector).with_port(2222);

        let err = probe.probe("10.0.0.5", "root", "pw").await.err();
        assert!(matches!(err, Some(AuthError::Unreachable { .. })));
        assert_eq!(connector.attempts(), 1);
    }

    #[test]
    fn test_parse_runlevel() {
        assert_eq!(parse_runlevel("N 5"), Some("5"));
        assert_eq!(parse_runlevel("5 3\n"), Some("3"));
        assert_eq!(parse_runlevel("3"), Some("3"));
        assert_eq!(parse_runlevel("unknown"), Some("unknown"));
        assert_eq!(parse_runlevel(""), None);
    }

    #[test]
    fn test_parse_property_value() {
        assert_eq!(
            parse_property_value("ActiveEnterTimestamp=Thu 2024-01-04 10:00:05 UTC"),
            Some("Thu 2024-01-04 10:00:05 UTC")
        );
        assert_eq!(parse_property_value("ActiveEnterTimestamp="), None);
        assert_eq!(parse_property_value(""), None);
    }

    #[test]
    fn test_timestamp_command_strips_quotes() {
        assert_eq!(
            timestamp_to_epoch("Thu 2024-01-04 10:00:05 UTC"),
            "date -d 'Thu 2024-01-04 10:00:05 UTC' +%s"
        );
        assert_eq!(
            timestamp_to_epoch("x'; reboot; echo '$(id)"),
            "date -d 'x; reboot; echo (id)' +%s"
        );
    }
}

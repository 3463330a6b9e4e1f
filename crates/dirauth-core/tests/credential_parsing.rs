//! Parsing tests for upstream-asserted login values.

use dirauth_core::LoginCredentials;

#[test]
fn remote_user_round_trip() {
    let creds = LoginCredentials::from_remote_user("CORP\\jsmith").expect("valid remote user");
    assert_eq!(creds.username(), "jsmith");
    assert!(creds.is_trusted());
}

#[test]
fn remote_user_username_is_lowercased() {
    let creds = LoginCredentials::from_remote_user("CORP\\JSMITH").expect("valid remote user");
    assert_eq!(creds.username(), "jsmith");
}

#[test]
fn malformed_remote_users_are_rejected() {
    for value in ["jsmith", "A\\B\\C", "", "\\", "CORP\\", "\\jsmith"] {
        assert!(
            LoginCredentials::from_remote_user(value).is_none(),
            "expected rejection for {value:?}"
        );
    }
}

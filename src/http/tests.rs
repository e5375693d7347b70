use super::*;

#[test]
fn returns_first_success() {
    let mut calls = 0;
    let result = request_with_retry("test", 3, || {
        calls += 1;
        Ok("ok".to_string())
    });

    assert_eq!(result.expect("request should succeed"), "ok");
    assert_eq!(calls, 1);
}

#[test]
fn client_errors_are_not_retried() {
    let mut calls = 0;
    let result = request_with_retry("test", 3, || {
        calls += 1;
        Err(ureq::Error::StatusCode(404))
    });

    let err = result.expect_err("404 should fail");
    assert!(err.to_string().contains("HTTP 404"));
    assert_eq!(calls, 1);
}

#[test]
fn server_errors_exhaust_attempts() {
    let mut calls = 0;
    let result = request_with_retry("test", 1, || {
        calls += 1;
        Err(ureq::Error::StatusCode(503))
    });

    assert!(result.is_err());
    assert_eq!(calls, 1);
}

#[test]
fn recovers_after_transient_failure() {
    let mut calls = 0;
    let result = request_with_retry("test", 2, || {
        calls += 1;
        if calls == 1 {
            Err(ureq::Error::ConnectionFailed)
        } else {
            Ok("second".to_string())
        }
    });

    assert_eq!(result.expect("second attempt should succeed"), "second");
    assert_eq!(calls, 2);
}

#[test]
fn zero_attempts_still_tries_once() {
    let mut calls = 0;
    let result = request_with_retry("test", 0, || {
        calls += 1;
        Ok(String::new())
    });

    assert!(result.is_ok());
    assert_eq!(calls, 1);
}

use async_trait::async_trait;
use nexa_frontend::models::{ApiReply, OtpRequest, OtpValidation, PasswordReset};
use nexa_frontend::reset::{Notice, ResetFlow, Step, WizardError, AUTO_SUBMIT_DELAY};
use nexa_frontend::services::{ClientError, PasswordResetApi};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq)]
enum Call {
    RequestOtp(OtpRequest),
    ValidateOtp(OtpValidation),
    ResetPassword(PasswordReset),
}

/// Records every call and answers with a fixed reply per endpoint.
#[derive(Clone)]
struct FakeApi {
    calls: Arc<Mutex<Vec<Call>>>,
    otp_reply: ApiReply,
    validate_reply: ApiReply,
    reset_reply: ApiReply,
}

impl FakeApi {
    fn accepting() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            otp_reply: ApiReply {
                success: true,
                message: Some("OTP sent".into()),
            },
            validate_reply: ApiReply::ok(),
            reset_reply: ApiReply::ok(),
        }
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PasswordResetApi for FakeApi {
    async fn request_otp(&self, request: &OtpRequest) -> Result<ApiReply, ClientError> {
        self.calls.lock().unwrap().push(Call::RequestOtp(request.clone()));
        Ok(self.otp_reply.clone())
    }

    async fn validate_otp(&self, request: &OtpValidation) -> Result<ApiReply, ClientError> {
        self.calls.lock().unwrap().push(Call::ValidateOtp(request.clone()));
        Ok(self.validate_reply.clone())
    }

    async fn reset_password(&self, request: &PasswordReset) -> Result<ApiReply, ClientError> {
        self.calls.lock().unwrap().push(Call::ResetPassword(request.clone()));
        Ok(self.reset_reply.clone())
    }
}

async fn at_otp_step(api: &FakeApi) -> ResetFlow<FakeApi> {
    let mut flow = ResetFlow::new(api.clone());
    flow.send_otp("user@test.com", Some("tok")).await.unwrap();
    flow.take_notices();
    flow
}

#[tokio::test]
async fn invalid_email_makes_no_call() {
    let api = FakeApi::accepting();
    let mut flow = ResetFlow::new(api.clone());

    let err = flow.send_otp("not-an-email", Some("tok")).await.unwrap_err();

    assert!(matches!(err, WizardError::InvalidEmail));
    assert!(api.calls().is_empty());
    assert_eq!(flow.wizard().step(), Step::EmailEntry);
    assert!(flow.wizard().error().is_some());
}

#[tokio::test]
async fn missing_captcha_makes_no_call() {
    let api = FakeApi::accepting();
    let mut flow = ResetFlow::new(api.clone());

    let err = flow.send_otp("user@test.com", Some("  ")).await.unwrap_err();

    assert!(matches!(err, WizardError::MissingCaptcha));
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn sending_otp_advances_with_success_toast() {
    let api = FakeApi::accepting();
    let mut flow = ResetFlow::new(api.clone());

    let step = flow.send_otp("user@test.com", Some("tok")).await.unwrap();

    assert_eq!(step, Step::OtpVerify);
    assert_eq!(
        api.calls(),
        vec![Call::RequestOtp(OtpRequest {
            captcha_token: "tok".into(),
            email: "user@test.com".into(),
        })]
    );
    assert_eq!(flow.take_notices(), vec![Notice::Success("OTP sent".into())]);
    assert!(!flow.wizard().is_busy());
}

#[tokio::test]
async fn rejected_otp_request_stays_on_first_step() {
    let mut api = FakeApi::accepting();
    api.otp_reply = ApiReply::failed("User not found");
    let mut flow = ResetFlow::new(api.clone());

    let step = flow.send_otp("user@test.com", Some("tok")).await.unwrap();

    assert_eq!(step, Step::EmailEntry);
    assert_eq!(flow.wizard().error(), Some("User not found"));
    assert_eq!(flow.take_notices(), vec![Notice::Error("User not found".into())]);
}

#[tokio::test]
async fn incomplete_code_is_not_submitted() {
    let api = FakeApi::accepting();
    let mut flow = at_otp_step(&api).await;

    for (i, ch) in "12345".chars().enumerate() {
        flow.enter_digit(i, ch).await.unwrap();
    }
    let err = flow.submit_otp().await.unwrap_err();

    assert!(matches!(err, WizardError::IncompleteOtp));
    assert_eq!(api.calls().len(), 1);
    assert_eq!(flow.wizard().step(), Step::OtpVerify);
}

#[tokio::test(start_paused = true)]
async fn sixth_digit_submits_after_delay() {
    let api = FakeApi::accepting();
    let mut flow = at_otp_step(&api).await;

    for (i, ch) in "12345".chars().enumerate() {
        flow.enter_digit(i, ch).await.unwrap();
    }
    assert_eq!(api.calls().len(), 1);

    let started = tokio::time::Instant::now();
    let step = flow.enter_digit(5, '6').await.unwrap();

    assert!(started.elapsed() >= AUTO_SUBMIT_DELAY);
    assert_eq!(step, Step::NewPassword);
    assert_eq!(
        api.calls().last(),
        Some(&Call::ValidateOtp(OtpValidation {
            email: "user@test.com".into(),
            otp: "123456".into(),
        }))
    );
}

#[tokio::test]
async fn wrong_code_clears_digits_without_toast() {
    let mut api = FakeApi::accepting();
    api.validate_reply = ApiReply::failed("Invalid OTP");
    let mut flow = at_otp_step(&api).await;

    for (i, ch) in "99999".chars().enumerate() {
        flow.enter_digit(i, ch).await.unwrap();
    }
    let step = flow.enter_digit(5, '9').await.unwrap();

    assert_eq!(step, Step::OtpVerify);
    assert_eq!(flow.wizard().error(), Some("Invalid OTP"));
    assert_eq!(flow.wizard().otp().filled(), 0);
    assert!(flow.take_notices().is_empty());
}

#[tokio::test]
async fn full_reset_closes_the_wizard() {
    let api = FakeApi::accepting();
    let mut flow = at_otp_step(&api).await;

    for (i, ch) in "123456".chars().enumerate() {
        flow.enter_digit(i, ch).await.unwrap();
    }

    let err = flow.reset_password("weak", "weak").await.unwrap_err();
    assert!(matches!(err, WizardError::WeakPassword(_)));

    let err = flow.reset_password("Str0ng!pass", "Str0ng!pasS").await.unwrap_err();
    assert!(matches!(err, WizardError::PasswordMismatch));
    assert_eq!(api.calls().len(), 2);

    let step = flow.reset_password("Str0ng!pass", "Str0ng!pass").await.unwrap();

    assert_eq!(step, Step::EmailEntry);
    assert_eq!(flow.wizard().email(), "");
    assert_eq!(
        api.calls().last(),
        Some(&Call::ResetPassword(PasswordReset {
            email: "user@test.com".into(),
            password: "Str0ng!pass".into(),
        }))
    );
    assert!(matches!(flow.take_notices().as_slice(), [Notice::Success(_)]));
}

#[tokio::test]
async fn back_keeps_email_and_resend_uses_it() {
    let api = FakeApi::accepting();
    let mut flow = at_otp_step(&api).await;

    flow.resend_otp(Some("tok2")).await.unwrap();
    assert_eq!(
        api.calls().last(),
        Some(&Call::RequestOtp(OtpRequest {
            captcha_token: "tok2".into(),
            email: "user@test.com".into(),
        }))
    );

    assert!(flow.back());
    assert_eq!(flow.wizard().step(), Step::EmailEntry);
    assert_eq!(flow.wizard().email(), "user@test.com");
    assert!(!flow.back());
}

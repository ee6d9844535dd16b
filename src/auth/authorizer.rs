use crate::auth::jwt::JwtHelper;

use aws_lambda_events::event::{
    apigw::{ApiGatewayCustomAuthorizerPolicy, ApiGatewayCustomAuthorizerResponse},
    iam::{IamPolicyEffect, IamPolicyStatement},
};

const POLICY_VERSION: &str = "2012-10-17";
const INVOKE_ACTION: &str = "execute-api:Invoke";
const DEFAULT_PRINCIPAL: &str = "user";

#[allow(clippy::field_reassign_with_default)]
fn policy(
    principal_id: &str,
    effect: IamPolicyEffect,
    resource: &str,
    context: serde_json::Value,
) -> ApiGatewayCustomAuthorizerResponse {
    let mut statement = IamPolicyStatement::default();
    statement.action = vec![INVOKE_ACTION.to_string()];
    statement.effect = effect;
    statement.resource = vec![resource.to_string()];

    let mut policy_document = ApiGatewayCustomAuthorizerPolicy::default();
    policy_document.version = Some(POLICY_VERSION.to_string());
    policy_document.statement = vec![statement];

    let mut response = ApiGatewayCustomAuthorizerResponse::default();
    response.principal_id = Some(principal_id.to_string());
    response.policy_document = policy_document;
    response.context = context;
    response
}

/// Allow `principal_id` to invoke `resource`, forwarding `context` to the
/// integration.
pub fn allow_policy(
    principal_id: &str,
    resource: &str,
    context: serde_json::Value,
) -> ApiGatewayCustomAuthorizerResponse {
    policy(principal_id, IamPolicyEffect::Allow, resource, context)
}

/// Deny `principal_id` access to `resource`.
pub fn deny_policy(principal_id: &str, resource: &str) -> ApiGatewayCustomAuthorizerResponse {
    policy(
        principal_id,
        IamPolicyEffect::Deny,
        resource,
        serde_json::Value::Null,
    )
}

/// The token of an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Build the authorizer response for a bearer `authorization_header`.
///
/// A valid token yields an allow policy whose principal is the `sub` claim
/// and whose context holds the token claims. Anything else yields a deny
/// policy.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(name = "lambda_commons.authorize", skip(helper, authorization_header))
)]
pub fn authorize(
    helper: &JwtHelper,
    authorization_header: &str,
    method_arn: &str,
) -> ApiGatewayCustomAuthorizerResponse {
    let claims = bearer_token(authorization_header)
        .and_then(|token| helper.validate_token::<serde_json::Value>(token).ok());
    match claims {
        Some(claims) => {
            let principal_id = claims
                .get("sub")
                .and_then(serde_json::Value::as_str)
                .unwrap_or(DEFAULT_PRINCIPAL)
                .to_string();
            allow_policy(&principal_id, method_arn, claims)
        }
        None => {
            #[cfg(feature = "tracing")]
            tracing::debug!("denying request with a missing or invalid bearer token");
            deny_policy(DEFAULT_PRINCIPAL, method_arn)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::auth::jwt::tests::helper;
    use rstest::rstest;
    use serde_json::json;

    const METHOD_ARN: &str = "arn:aws:execute-api:eu-west-1:123456789012:abc/prod/GET/items";

    fn effect(response: &ApiGatewayCustomAuthorizerResponse) -> &IamPolicyEffect {
        &response.policy_document.statement[0].effect
    }

    #[rstest]
    #[case::bearer("Bearer abc", Some("abc"))]
    #[case::lowercase("bearer abc", Some("abc"))]
    #[case::padded("  Bearer   abc ", Some("abc"))]
    #[case::basic("Basic abc", None)]
    #[case::no_token("Bearer", None)]
    #[case::empty("", None)]
    fn test_bearer_token(#[case] header: &str, #[case] expected: Option<&str>) {
        assert_eq!(bearer_token(header), expected);
    }

    #[test]
    fn test_allow_policy() {
        let response = allow_policy("123", METHOD_ARN, json!({"role": "admin"}));
        let statement = &response.policy_document.statement[0];

        assert_eq!(response.principal_id.as_deref(), Some("123"));
        assert_eq!(
            response.policy_document.version.as_deref(),
            Some(POLICY_VERSION)
        );
        assert_eq!(statement.action, vec![INVOKE_ACTION.to_string()]);
        assert_eq!(statement.resource, vec![METHOD_ARN.to_string()]);
        assert_eq!(statement.effect, IamPolicyEffect::Allow);
        assert_eq!(response.context, json!({"role": "admin"}));
    }

    #[test]
    fn test_authorize_valid_token() {
        let helper = helper();
        let token = helper
            .generate_token(&json!({"sub": "123", "role": "admin"}))
            .unwrap();

        let response = authorize(&helper, &format!("Bearer {token}"), METHOD_ARN);

        assert_eq!(effect(&response), &IamPolicyEffect::Allow);
        assert_eq!(response.principal_id.as_deref(), Some("123"));
        assert_eq!(response.context, json!({"sub": "123", "role": "admin"}));
    }

    #[test]
    fn test_authorize_without_subject() {
        let helper = helper();
        let token = helper.generate_token(&json!({"role": "admin"})).unwrap();

        let response = authorize(&helper, &format!("Bearer {token}"), METHOD_ARN);

        assert_eq!(effect(&response), &IamPolicyEffect::Allow);
        assert_eq!(response.principal_id.as_deref(), Some(DEFAULT_PRINCIPAL));
    }

    #[rstest]
    #[case::invalid_token("Bearer invalidJwtToken")]
    #[case::wrong_scheme("Basic dXNlcjpwYXNz")]
    #[case::missing("")]
    fn test_authorize_denied(#[case] header: &str) {
        let response = authorize(&helper(), header, METHOD_ARN);
        assert_eq!(effect(&response), &IamPolicyEffect::Deny);
        assert_eq!(
            response.policy_document.statement[0].resource,
            vec![METHOD_ARN.to_string()]
        );
    }
}

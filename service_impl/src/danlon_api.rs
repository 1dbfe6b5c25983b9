//! Danløn GraphQL client and business operations.
//!
//! The `createPayParts` input is emitted as an escaped GraphQL literal
//! rather than typed variables: the upstream input type names have shifted
//! between schema versions, and a literal keeps us off that dependency.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use service::danlon_api::{
    CreatedPayPart, DanlonApiService, DanlonEmployee, GraphqlService, PayPart, PayPartCodeMeta,
};
use service::danlon_oauth::DanlonOauthService;
use service::ServiceError;
use tracing::info;

use crate::config::DanlonConfig;
use crate::ftz_auth::{transport_error, upstream_error};

pub struct GraphqlServiceImpl {
    config: Arc<DanlonConfig>,
    http: reqwest::Client,
}

impl GraphqlServiceImpl {
    pub fn new(config: Arc<DanlonConfig>) -> Self {
        Self {
            config,
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .expect("failed to build HTTP client"),
        }
    }
}

#[async_trait]
impl GraphqlService for GraphqlServiceImpl {
    async fn execute(
        &self,
        access_token: &str,
        query: &str,
        variables: Option<Value>,
    ) -> Result<Value, ServiceError> {
        let mut payload = serde_json::json!({ "query": query });
        if let Some(variables) = variables {
            payload["variables"] = variables;
        }

        let response = self
            .http
            .post(self.config.graphql_url.as_ref())
            .bearer_auth(access_token)
            .json(&payload)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(upstream_error(status.as_u16(), &body));
        }

        let body: Value = response.json().await.map_err(transport_error)?;
        if let Some(errors) = body.get("errors").and_then(Value::as_array) {
            if !errors.is_empty() {
                let messages: Vec<&str> = errors
                    .iter()
                    .filter_map(|error| error.get("message").and_then(Value::as_str))
                    .collect();
                return Err(ServiceError::UpstreamGraphqlError(
                    messages.join(", ").into(),
                ));
            }
        }

        Ok(body.get("data").cloned().unwrap_or(Value::Null))
    }
}

/// Escape a string for inclusion in a double-quoted GraphQL literal.
fn escape_graphql(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// The `createPayParts` mutation with the input inlined as a literal.
fn build_create_pay_parts_mutation(company_id: &str, pay_parts: &[PayPart]) -> String {
    let mut literal = String::new();
    for (index, pay_part) in pay_parts.iter().enumerate() {
        if index > 0 {
            literal.push_str(", ");
        }
        literal.push_str(&format!(
            "{{employeeId: \"{}\", code: \"{}\"",
            escape_graphql(&pay_part.employee_id),
            escape_graphql(&pay_part.code),
        ));
        if let Some(units) = pay_part.units {
            literal.push_str(&format!(", units: {units}"));
        }
        if let Some(amount) = pay_part.amount {
            literal.push_str(&format!(", amount: {amount}"));
        }
        literal.push('}');
    }

    format!(
        "mutation {{ createPayParts(input: {{companyId: \"{}\", payParts: [{}]}}) {{ \
         createdPayParts {{ employeeId code units amount }} }} }}",
        escape_graphql(company_id),
        literal
    )
}

pub struct DanlonApiServiceImpl<Oauth: DanlonOauthService, Graphql: GraphqlService> {
    oauth_service: Arc<Oauth>,
    graphql_service: Arc<Graphql>,
}

impl<Oauth: DanlonOauthService + Send + Sync, Graphql: GraphqlService + Send + Sync>
    DanlonApiServiceImpl<Oauth, Graphql>
{
    pub fn new(oauth_service: Arc<Oauth>, graphql_service: Arc<Graphql>) -> Self {
        Self {
            oauth_service,
            graphql_service,
        }
    }

    async fn execute_as(
        &self,
        user_id: &str,
        company_id: &str,
        query: &str,
    ) -> Result<Value, ServiceError> {
        let access_token = self
            .oauth_service
            .get_valid_access_token(user_id, company_id)
            .await?;
        self.graphql_service
            .execute(access_token.as_ref(), query, None)
            .await
    }
}

#[async_trait]
impl<Oauth: DanlonOauthService + Send + Sync, Graphql: GraphqlService + Send + Sync>
    DanlonApiService for DanlonApiServiceImpl<Oauth, Graphql>
{
    async fn get_employees(
        &self,
        user_id: &str,
        company_id: &str,
    ) -> Result<Arc<[DanlonEmployee]>, ServiceError> {
        let data = self
            .execute_as(
                user_id,
                company_id,
                "{current_company{employees{id name domainId}}}",
            )
            .await?;
        let employees = data["current_company"]["employees"]
            .as_array()
            .cloned()
            .unwrap_or_default();

        Ok(employees
            .iter()
            .filter_map(|employee| {
                let id = employee["id"].as_str()?;
                Some(DanlonEmployee {
                    id: id.into(),
                    name: employee["name"].as_str().unwrap_or_default().into(),
                    domain_id: employee["domainId"].as_str().map(Arc::from),
                })
            })
            .collect())
    }

    async fn get_pay_parts_meta(
        &self,
        user_id: &str,
        company_id: &str,
    ) -> Result<Arc<[PayPartCodeMeta]>, ServiceError> {
        let data = self
            .execute_as(
                user_id,
                company_id,
                "{current_company{payPartsMeta{code description unitsAllowed rateAllowed amountAllowed}}}",
            )
            .await?;
        let metas = data["current_company"]["payPartsMeta"]
            .as_array()
            .cloned()
            .unwrap_or_default();

        Ok(metas
            .iter()
            .filter_map(|meta| {
                Some(PayPartCodeMeta {
                    code: meta["code"].as_str()?.into(),
                    description: meta["description"].as_str().unwrap_or_default().into(),
                    units_allowed: meta["unitsAllowed"].as_bool().unwrap_or(false),
                    rate_allowed: meta["rateAllowed"].as_bool().unwrap_or(false),
                    amount_allowed: meta["amountAllowed"].as_bool().unwrap_or(false),
                })
            })
            .collect())
    }

    async fn create_pay_parts(
        &self,
        user_id: &str,
        company_id: &str,
        pay_parts: &[PayPart],
    ) -> Result<Arc<[CreatedPayPart]>, ServiceError> {
        let mutation = build_create_pay_parts_mutation(company_id, pay_parts);
        info!(
            user_id,
            company_id,
            count = pay_parts.len(),
            "submitting createPayParts"
        );
        let data = self.execute_as(user_id, company_id, &mutation).await?;

        let created = data["createPayParts"]["createdPayParts"]
            .as_array()
            .cloned()
            .unwrap_or_default();
        Ok(created
            .iter()
            .map(|pay_part| CreatedPayPart {
                employee_id: pay_part["employeeId"].as_str().unwrap_or_default().into(),
                code: pay_part["code"].as_str().unwrap_or_default().into(),
                units: pay_part["units"].as_i64(),
                amount: pay_part["amount"].as_i64(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pay_part(employee_id: &str, code: &str, units: Option<i64>, amount: Option<i64>) -> PayPart {
        PayPart {
            employee_id: employee_id.into(),
            code: code.into(),
            units,
            amount,
        }
    }

    #[test]
    fn mutation_inlines_pay_parts_as_literal() {
        let mutation = build_create_pay_parts_mutation(
            "company-1",
            &[
                pay_part("emp-1", "T1", Some(740), None),
                pay_part("emp-1", "T3", None, Some(750)),
            ],
        );
        assert_eq!(
            mutation,
            "mutation { createPayParts(input: {companyId: \"company-1\", payParts: \
             [{employeeId: \"emp-1\", code: \"T1\", units: 740}, \
             {employeeId: \"emp-1\", code: \"T3\", amount: 750}]}) \
             { createdPayParts { employeeId code units amount } } }"
        );
    }

    #[test]
    fn literal_escapes_quotes_and_newlines() {
        let mutation = build_create_pay_parts_mutation(
            "acme \"demo\"\n",
            &[pay_part("emp\\1", "T1", Some(100), None)],
        );
        assert!(mutation.contains("companyId: \"acme \\\"demo\\\"\\n\""));
        assert!(mutation.contains("employeeId: \"emp\\\\1\""));
    }
}

//! Signed HTTP transport for AWS Query and REST APIs

use crate::error::{AwsError, Result};
use crate::sigv4::{SigV4Signer, SigningInput, uri_encode};
use crate::xml;
use chrono::Utc;
use stratus_cloud::AwsCredentials;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Per-service endpoint overrides, used by tests and local emulators.
/// `None` resolves to the public regional AWS host.
#[derive(Debug, Clone, Default)]
pub struct AwsEndpoints {
    pub sts: Option<String>,
    pub ec2: Option<String>,
    pub rds: Option<String>,
    pub s3: Option<String>,
}

impl AwsEndpoints {
    fn base_url(&self, service: &str, region: &str) -> String {
        let this = match service {
            "sts" => &self.sts,
            "ec2" => &self.ec2,
            "rds" => &self.rds,
            "s3" => &self.s3,
            _ => &None,
        };
        match this {
            Some(base) => base.trim_end_matches('/').to_string(),
            None => format!("https://{service}.{region}.amazonaws.com"),
        }
    }
}

/// Signed AWS API client shared by the probe and the provisioners
pub struct AwsClient {
    http: reqwest::Client,
    credentials: AwsCredentials,
    endpoints: AwsEndpoints,
}

impl AwsClient {
    pub fn new(
        http: reqwest::Client,
        credentials: AwsCredentials,
        endpoints: AwsEndpoints,
    ) -> Self {
        Self {
            http,
            credentials,
            endpoints,
        }
    }

    pub fn credentials(&self) -> &AwsCredentials {
        &self.credentials
    }

    /// POST a Query-API action as a signed form body and return the XML
    /// response. Non-2xx responses surface the document's `<Message>`.
    pub async fn query_request(
        &self,
        service: &str,
        region: &str,
        params: &[(String, String)],
    ) -> Result<String> {
        let url = self.endpoints.base_url(service, region);
        let (parsed, host) = parse_host(&url)?;
        let body = form_urlencode(params);

        let signer = SigV4Signer::new(&self.credentials);
        let signed = signer.sign(&SigningInput {
            method: "POST",
            service,
            region,
            host: &host,
            path: "/",
            query: &[],
            content_type: Some(FORM_CONTENT_TYPE),
            body: body.as_bytes(),
            timestamp: Utc::now(),
            payload_hash_header: false,
        })?;

        tracing::debug!(service, region, action = params_action(params), "aws query request");

        let mut request = self
            .http
            .post(parsed)
            .header("content-type", FORM_CONTENT_TYPE)
            .header("x-amz-date", &signed.amz_date)
            .header("authorization", &signed.authorization);
        if let Some(token) = &signed.security_token {
            request = request.header("x-amz-security-token", token);
        }

        let response = request.body(body).send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(AwsError::Api {
                status: status.as_u16(),
                message: xml::error_message(&text),
            });
        }
        Ok(text)
    }

    /// Path-style S3 CreateBucket. Regions other than us-east-1 need a
    /// LocationConstraint body.
    pub async fn create_bucket(&self, bucket: &str, region: &str) -> Result<()> {
        let base = self.endpoints.base_url("s3", region);
        let path = format!("/{}", uri_encode(bucket, true));
        let url = format!("{base}{path}");
        let (parsed, host) = parse_host(&url)?;

        let body = if region == "us-east-1" {
            String::new()
        } else {
            format!(
                "<CreateBucketConfiguration xmlns=\"http://s3.amazonaws.com/doc/2006-03-01/\">\
                 <LocationConstraint>{region}</LocationConstraint>\
                 </CreateBucketConfiguration>"
            )
        };
        let content_type = (!body.is_empty()).then_some("application/xml");

        let signer = SigV4Signer::new(&self.credentials);
        let signed = signer.sign(&SigningInput {
            method: "PUT",
            service: "s3",
            region,
            host: &host,
            path: &path,
            query: &[],
            content_type,
            body: body.as_bytes(),
            timestamp: Utc::now(),
            // S3 rejects requests without a signed payload hash.
            payload_hash_header: true,
        })?;

        tracing::debug!(bucket, region, "s3 create bucket");

        let mut request = self
            .http
            .put(parsed)
            .header("x-amz-date", &signed.amz_date)
            .header("authorization", &signed.authorization);
        if let Some(hash) = &signed.content_sha256 {
            request = request.header("x-amz-content-sha256", hash);
        }
        if let Some(content_type) = content_type {
            request = request.header("content-type", content_type);
        }
        if let Some(token) = &signed.security_token {
            request = request.header("x-amz-security-token", token);
        }

        let response = request.body(body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AwsError::Api {
                status: status.as_u16(),
                message: xml::error_message(&text),
            });
        }
        Ok(())
    }
}

fn parse_host(url: &str) -> Result<(reqwest::Url, String)> {
    let parsed =
        reqwest::Url::parse(url).map_err(|e| AwsError::InvalidEndpoint(format!("{url}: {e}")))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| AwsError::InvalidEndpoint(format!("{url}: no host")))?;
    // The Host header carries the port when it is non-default, and the
    // signature must agree with what reqwest sends.
    let host = match parsed.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    };
    Ok((parsed, host))
}

fn form_urlencode(params: &[(String, String)]) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", uri_encode(k, true), uri_encode(v, true)))
        .collect::<Vec<_>>()
        .join("&")
}

fn params_action(params: &[(String, String)]) -> &str {
    params
        .iter()
        .find(|(k, _)| k == "Action")
        .map(|(_, v)| v.as_str())
        .unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_defaults_and_overrides() {
        let endpoints = AwsEndpoints {
            sts: Some("http://127.0.0.1:9000/".to_string()),
            ..Default::default()
        };
        assert_eq!(endpoints.base_url("sts", "us-east-1"), "http://127.0.0.1:9000");
        assert_eq!(
            endpoints.base_url("ec2", "eu-west-1"),
            "https://ec2.eu-west-1.amazonaws.com"
        );
    }

    #[test]
    fn test_parse_host_keeps_port() {
        let (_, host) = parse_host("http://127.0.0.1:9000/").unwrap();
        assert_eq!(host, "127.0.0.1:9000");
        let (_, host) = parse_host("https://sts.us-east-1.amazonaws.com").unwrap();
        assert_eq!(host, "sts.us-east-1.amazonaws.com");
    }

    #[test]
    fn test_form_urlencode_escapes_values() {
        let params = vec![
            ("Action".to_string(), "RunInstances".to_string()),
            ("Tag".to_string(), "web server".to_string()),
        ];
        assert_eq!(form_urlencode(&params), "Action=RunInstances&Tag=web%20server");
    }
}

use clap::{Parser, ValueEnum};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Mint an HMAC-signed development token for the realtime gateway.
///
/// The gateway only verifies tokens; real ones come from the auth service.
/// This tool exists so a socket can be opened locally:
/// - `--format cookie` prints a `Cookie` header value (`token=<jwt>`)
/// - `--format bearer` prints an `Authorization` header value (`Bearer <jwt>`)
#[derive(Parser, Debug)]
#[command(name = "token-gen", version, about)]
struct Args {
    /// Subject claim (`sub`)
    #[arg(long)]
    sub: String,

    /// Signing secret; must match the gateway's JWT_SECRET
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    secret: String,

    /// HS256 / HS384 / HS512
    #[arg(long, default_value = "HS256")]
    alg: String,

    /// Adds `exp = now + ttl`. Without it the token never expires.
    #[arg(long)]
    ttl_seconds: Option<i64>,

    /// Extra claim, repeatable. Values are parsed as JSON, falling back to a string.
    #[arg(long = "claim", value_name = "KEY=VALUE")]
    claims: Vec<String>,

    /// Add a random `jti`
    #[arg(long, default_value_t = false)]
    jti: bool,

    #[arg(long, value_enum, default_value_t = Format::Raw)]
    format: Format,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Raw,
    Cookie,
    Bearer,
}

fn parse_algorithm(raw: &str) -> Result<Algorithm, String> {
    match raw.to_ascii_uppercase().as_str() {
        "HS256" => Ok(Algorithm::HS256),
        "HS384" => Ok(Algorithm::HS384),
        "HS512" => Ok(Algorithm::HS512),
        other => Err(format!("unsupported algorithm: {other} (expected HS256/HS384/HS512)")),
    }
}

fn parse_claim(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("claim must look like KEY=VALUE: {raw}"))?;
    if key.is_empty() {
        return Err(format!("claim key is empty: {raw}"));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

fn build_claims(args: &Args, now: i64) -> Result<Map<String, Value>, String> {
    let mut claims = Map::new();
    claims.insert("sub".to_string(), Value::String(args.sub.clone()));
    claims.insert("iat".to_string(), Value::Number(now.into()));

    if let Some(ttl) = args.ttl_seconds {
        claims.insert("exp".to_string(), Value::Number((now + ttl).into()));
    }
    if args.jti {
        claims.insert(
            "jti".to_string(),
            Value::String(Uuid::new_v4().to_string()),
        );
    }
    for raw in &args.claims {
        let (key, value) = parse_claim(raw)?;
        claims.insert(key, value);
    }

    Ok(claims)
}

fn render(token: &str, format: Format) -> String {
    match format {
        Format::Raw => token.to_string(),
        Format::Cookie => format!("token={token}"),
        Format::Bearer => format!("Bearer {token}"),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let algorithm = parse_algorithm(&args.alg)?;
    let claims = build_claims(&args, chrono::Utc::now().timestamp())?;

    let token = jsonwebtoken::encode(
        &Header::new(algorithm),
        &claims,
        &EncodingKey::from_secret(args.secret.as_bytes()),
    )?;

    println!("{}", render(&token, args.format));
    Ok(())
}

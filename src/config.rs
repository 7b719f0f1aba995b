use clap::Parser;
use std::time::Duration;

use crate::cache::DEFAULT_PRICE_TTL;
use crate::rate_limit::RateLimitPolicy;

// CLI argument structure
#[derive(Parser, Debug, Clone)]
#[command(name = "nft-market-gateway")]
#[command(about = "Crypto pricing and rate limiting gateway for the NFT storefront")]
pub struct Args {
    // Port to run the server on
    #[arg(short, long, default_value_t = 8080)]
    pub port: u16,

    // CoinGecko API base url
    #[arg(long, default_value = "https://api.coingecko.com/api/v3")]
    pub coingecko_url: String,

    // Price cache TTL in seconds
    #[arg(long, default_value_t = DEFAULT_PRICE_TTL.as_secs(), value_parser = clap::value_parser!(u64).range(1..))]
    pub price_ttl: u64,

    // Upstream price fetch timeout in seconds
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
    pub fetch_timeout: u64,

    // General API limiter: max requests per window
    #[arg(long, default_value_t = 100, value_parser = clap::value_parser!(u32).range(1..))]
    pub api_rate_limit: u32,

    // General API limiter window in seconds
    #[arg(long, default_value_t = 900, value_parser = clap::value_parser!(u64).range(1..))]
    pub api_rate_window: u64,

    // Strict limiter (conversions): max requests per window
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u32).range(1..))]
    pub strict_rate_limit: u32,

    // Strict limiter window in seconds
    #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u64).range(1..))]
    pub strict_rate_window: u64,

    // How often expired rate limit entries are swept, in seconds
    #[arg(long, default_value_t = 300, value_parser = clap::value_parser!(u64).range(1..))]
    pub sweep_interval: u64,
}

impl Args {
    pub fn api_policy(&self) -> RateLimitPolicy {
        RateLimitPolicy {
            window: Duration::from_secs(self.api_rate_window),
            max_requests: self.api_rate_limit,
            message: "Too many requests, please try again later".to_string(),
        }
    }

    pub fn strict_policy(&self) -> RateLimitPolicy {
        RateLimitPolicy {
            window: Duration::from_secs(self.strict_rate_window),
            max_requests: self.strict_rate_limit,
            message: "Rate limit exceeded, please slow down".to_string(),
        }
    }

    pub fn price_ttl(&self) -> Duration {
        Duration::from_secs(self.price_ttl)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_storefront_limits() {
        let args = Args::parse_from(["nft-market-gateway"]);

        assert_eq!(args.port, 8080);
        assert_eq!(args.price_ttl(), Duration::from_secs(60));
        assert_eq!(args.fetch_timeout(), Duration::from_secs(10));
        assert_eq!(args.api_policy().max_requests, 100);
        assert_eq!(args.api_policy().window, Duration::from_secs(15 * 60));
        assert_eq!(args.strict_policy().max_requests, 10);
        assert_eq!(args.strict_policy().window, Duration::from_secs(60));
        assert_eq!(args.sweep_interval(), Duration::from_secs(300));
    }

    #[test]
    fn flags_override_defaults() {
        let args = Args::parse_from([
            "nft-market-gateway",
            "--port",
            "9000",
            "--strict-rate-limit",
            "3",
            "--strict-rate-window",
            "5",
        ]);

        assert_eq!(args.port, 9000);
        assert_eq!(args.strict_policy().max_requests, 3);
        assert_eq!(args.strict_policy().window, Duration::from_secs(5));
    }

    #[test]
    fn zero_durations_and_limits_are_rejected() {
        for flag in [
            "--sweep-interval",
            "--price-ttl",
            "--fetch-timeout",
            "--api-rate-limit",
            "--api-rate-window",
            "--strict-rate-limit",
            "--strict-rate-window",
        ] {
            let parsed = Args::try_parse_from(["nft-market-gateway", flag, "0"]);
            assert!(parsed.is_err(), "{flag} accepted 0");
        }
    }
}

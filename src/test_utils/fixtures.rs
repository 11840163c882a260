/// Two series of the same metric that only differ by the `pod` label.
pub const MEMORY_USAGE_PAYLOAD: &str = "memory_usage{pod=\"a\",namespace=\"n\"} 512.0\n\
memory_usage{pod=\"b\",namespace=\"n\"} 512.0\n";

pub const MIXED_PAYLOAD: &str = r#"# HELP http_requests_total Requests served.
# TYPE http_requests_total counter
http_requests_total{method="get",code="200"} 1027
http_requests_total{method="post",code="500"} 3

# A bare metric and an empty label value
up 1
build_info{version="",branch="main"} 1
temperature{room="kitchen, north"} -3.5
"#;

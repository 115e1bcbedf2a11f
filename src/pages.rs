use axum::response::Html;

/// Homepage linking the two client apps
pub async fn index() -> Html<&'static str> {
    Html(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>Classroom Chat Server</title>
</head>
<body style="font-family: Arial, sans-serif; max-width: 600px; margin: 50px auto; padding: 20px; text-align: center;">
    <h1>Classroom Chat Server</h1>
    <h2>The server is up and running</h2>

    <div style="margin: 30px 0;">
        <a href="/teacher-dashboard.html" style="background: #2196F3; color: white; padding: 15px 25px; text-decoration: none; border-radius: 8px; margin: 10px;">
            Teacher dashboard
        </a>
        <a href="/student-app.html" style="background: #4CAF50; color: white; padding: 15px 25px; text-decoration: none; border-radius: 8px; margin: 10px;">
            Student app
        </a>
    </div>

    <p>WebSocket endpoint at <code>/ws</code></p>
</body>
</html>
"#,
    )
}

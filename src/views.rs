//! Minimal HTML pages. Every interpolated value goes through `escape`.

use axum::response::Html;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

use crate::students::repo_types::Student;

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Characters that cannot appear raw inside one URL path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Roll number as a single path segment, safe inside an attribute.
fn roll_segment(roll_no: &str) -> String {
    escape(&utf8_percent_encode(roll_no, PATH_SEGMENT).to_string())
}

fn page(title: &str, notice: Option<&str>, body: &str) -> Html<String> {
    let notice = notice
        .map(|n| format!("<p class=\"notice\">{}</p>\n", escape(n)))
        .unwrap_or_default();
    Html(format!(
        "<!doctype html>\n<html>\n<head><meta charset=\"utf-8\"><title>{}</title></head>\n<body>\n{}{}\n</body>\n</html>\n",
        escape(title),
        notice,
        body
    ))
}

pub fn signup(notice: Option<&str>) -> Html<String> {
    page(
        "Sign up",
        notice,
        r#"<h1>Sign up</h1>
<form method="post" action="/signup">
  <input name="username" placeholder="Username" required>
  <input name="email" type="email" placeholder="Email" required>
  <input name="password" type="password" placeholder="Password" required>
  <input name="cpassword" type="password" placeholder="Confirm password" required>
  <button type="submit">Sign up</button>
</form>
<p><a href="/login">Log in</a></p>"#,
    )
}

pub fn login(notice: Option<&str>) -> Html<String> {
    page(
        "Log in",
        notice,
        r#"<h1>Log in</h1>
<form method="post" action="/login">
  <input name="email" type="email" placeholder="Email" required>
  <input name="password" type="password" placeholder="Password" required>
  <button type="submit">Log in</button>
</form>
<p><a href="/signup">Sign up</a></p>"#,
    )
}

pub fn welcome(username: &str, notice: Option<&str>) -> Html<String> {
    page(
        "Welcome",
        notice,
        &format!(
            "<h1>Welcome, {}!</h1>\n<p><a href=\"/dashboard\">Dashboard</a> | <a href=\"/logout\">Log out</a></p>",
            escape(username)
        ),
    )
}

pub fn dashboard(username: &str, students: &[Student], notice: Option<&str>) -> Html<String> {
    let mut body = format!(
        "<h1>Students</h1>\n<p>Signed in as {} | <a href=\"/logout\">Log out</a></p>\n",
        escape(username)
    );
    body.push_str(
        r#"<form method="post" action="/add_student">
  <input name="roll_no" placeholder="Roll no" required>
  <input name="name" placeholder="Name" required>
  <input name="student_class" placeholder="Class" required>
  <button type="submit">Add</button>
</form>
<table>
<tr><th>Roll no</th><th>Name</th><th>Class</th><th></th></tr>
"#,
    );
    for s in students {
        let name = escape(&s.name);
        let class = escape(&s.class);
        let segment = roll_segment(&s.roll_no);
        body.push_str(&format!(
            "<tr><td>{roll}</td><td>{name}</td><td>{class}</td><td>\
<form method=\"post\" action=\"/edit_student/{segment}\">\
<input name=\"name\" value=\"{name}\"><input name=\"student_class\" value=\"{class}\">\
<button type=\"submit\">Save</button></form> \
<a href=\"/delete_student/{segment}\">Delete</a></td></tr>\n",
            roll = escape(&s.roll_no),
        ));
    }
    body.push_str("</table>");
    page("Dashboard", notice, &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    #[test]
    fn escapes_markup_in_values() {
        assert_eq!(escape("<b>\"x\" & 'y'</b>"), "&lt;b&gt;&quot;x&quot; &amp; &#x27;y&#x27;&lt;/b&gt;");
    }

    #[test]
    fn roll_segment_encodes_path_delimiters() {
        assert_eq!(roll_segment("7/B"), "7%2FB");
        assert_eq!(roll_segment("R#1"), "R%231");
        assert_eq!(roll_segment("a?b%c"), "a%3Fb%25c");
        assert_eq!(roll_segment("R1"), "R1");
    }

    #[test]
    fn dashboard_lists_rows_and_escapes_names() {
        let students = vec![Student {
            roll_no: "R1".into(),
            name: "<script>".into(),
            class: "5A".into(),
            is_active: true,
            created_by: "a@x.com".into(),
            created_on: OffsetDateTime::now_utc(),
            updated_by: None,
            updated_on: None,
        }];
        let Html(html) = dashboard("alice", &students, Some("Student added successfully."));
        assert!(html.contains("<td>R1</td>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
        assert!(html.contains("Student added successfully."));
    }
}

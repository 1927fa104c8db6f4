use crate::core::{MasterIdentity, MasterTransport};
use crate::utils::error::{ChooserError, Result};
use async_trait::async_trait;
use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesDecl, BytesRef, BytesText, Event};
use quick_xml::{Reader, Writer};
use reqwest::Client;
use std::time::Duration;
use url::Url;

const STATUS_SUCCESS: i32 = 1;

/// 透過 XML-RPC `getUri` 向 master 確認身分
pub struct XmlRpcMasterClient {
    client: Client,
}

impl XmlRpcMasterClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl MasterTransport for XmlRpcMasterClient {
    async fn identify(&self, master: &Url, caller_id: &str) -> Result<MasterIdentity> {
        let body = encode_call("getUri", &[caller_id])?;

        tracing::debug!("Sending getUri to {} as {}", master, caller_id);
        let response = self
            .client
            .post(master.clone())
            .header("Content-Type", "text/xml")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("Master response status: {}", status);
        if !status.is_success() {
            return Err(ChooserError::MalformedResponseError {
                message: format!("HTTP status {}", status),
            });
        }

        let text = response.text().await?;
        parse_identity(&text)
    }
}

/// 產生 `methodCall`，參數一律以 `<string>` 傳送
pub fn encode_call(method: &str, params: &[&str]) -> Result<Vec<u8>> {
    let mut writer = Writer::new(Vec::new());
    writer.write_event(Event::Decl(BytesDecl::new("1.0", None, None)))?;
    writer
        .create_element("methodCall")
        .write_inner_content(|w| {
            w.create_element("methodName")
                .write_text_content(BytesText::new(method))?;
            w.create_element("params").write_inner_content(|w| {
                for param in params {
                    w.create_element("param").write_inner_content(|w| {
                        w.create_element("value").write_inner_content(|w| {
                            w.create_element("string")
                                .write_text_content(BytesText::new(param))?;
                            Ok(())
                        })?;
                        Ok(())
                    })?;
                }
                Ok(())
            })?;
            Ok(())
        })?;
    Ok(writer.into_inner())
}

#[derive(Debug, Clone, PartialEq)]
enum XmlRpcValue {
    Int(i32),
    Str(String),
    Array(Vec<XmlRpcValue>),
    Struct(Vec<(String, XmlRpcValue)>),
    /// boolean / double / dateTime / base64，用不到但要能略過
    Other(String),
}

impl XmlRpcValue {
    fn as_text(&self) -> Option<&str> {
        match self {
            XmlRpcValue::Str(text) | XmlRpcValue::Other(text) => Some(text),
            _ => None,
        }
    }
}

enum Reply {
    Params(XmlRpcValue),
    Fault(XmlRpcValue),
}

fn malformed(message: impl Into<String>) -> ChooserError {
    ChooserError::MalformedResponseError {
        message: message.into(),
    }
}

fn xml_error(e: impl std::fmt::Display) -> ChooserError {
    malformed(format!("XML error: {}", e))
}

/// 解析 `getUri` 的回覆: [code, statusMessage, uri]
pub fn parse_identity(body: &str) -> Result<MasterIdentity> {
    let items = match read_reply(body)? {
        Reply::Fault(value) => {
            let message = match &value {
                XmlRpcValue::Struct(members) => members
                    .iter()
                    .find(|(name, _)| name == "faultString")
                    .and_then(|(_, v)| v.as_text())
                    .unwrap_or("unknown fault")
                    .to_string(),
                _ => "unknown fault".to_string(),
            };
            return Err(ChooserError::RemoteStatusError { code: -1, message });
        }
        Reply::Params(XmlRpcValue::Array(items)) => items,
        Reply::Params(other) => {
            return Err(malformed(format!("expected [code, message, value], got {:?}", other)))
        }
    };

    let status_code = match items.first() {
        Some(XmlRpcValue::Int(code)) => *code,
        _ => return Err(malformed("missing status code")),
    };
    let status_message = items
        .get(1)
        .and_then(XmlRpcValue::as_text)
        .unwrap_or_default()
        .to_string();

    if status_code != STATUS_SUCCESS {
        return Err(ChooserError::RemoteStatusError {
            code: status_code,
            message: status_message,
        });
    }

    let master_uri = items
        .get(2)
        .and_then(XmlRpcValue::as_text)
        .ok_or_else(|| malformed("missing master URI"))?
        .to_string();

    Ok(MasterIdentity {
        status_code,
        status_message,
        master_uri,
    })
}

fn read_reply(body: &str) -> Result<Reply> {
    let mut reader = Reader::from_str(body);
    let mut seen_response = false;
    let mut in_fault = false;

    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"methodResponse" => seen_response = true,
                b"fault" => in_fault = true,
                b"value" if seen_response => {
                    let value = read_value(&mut reader)?;
                    return Ok(wrap(in_fault, value));
                }
                _ => {}
            },
            Event::Empty(e) if seen_response && e.local_name().as_ref() == b"value" => {
                return Ok(wrap(in_fault, XmlRpcValue::Str(String::new())));
            }
            Event::Eof => {
                return Err(malformed(if seen_response {
                    "methodResponse carries no value"
                } else {
                    "response is not an XML-RPC methodResponse"
                }))
            }
            _ => {}
        }
    }
}

fn wrap(in_fault: bool, value: XmlRpcValue) -> Reply {
    if in_fault {
        Reply::Fault(value)
    } else {
        Reply::Params(value)
    }
}

/// 在 `<value>` 開始之後呼叫，讀到對應的 `</value>` 為止
fn read_value(reader: &mut Reader<&[u8]>) -> Result<XmlRpcValue> {
    let mut typed = None;
    // 沒有型別標籤時，內文就是字串
    let mut untyped = String::new();

    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Text(e) => untyped.push_str(&e.decode().map_err(xml_error)?),
            Event::CData(e) => untyped.push_str(&e.decode().map_err(xml_error)?),
            Event::GeneralRef(e) => push_entity(&mut untyped, &e)?,
            Event::Start(e) => {
                let tag = e.local_name().as_ref().to_vec();
                typed = Some(match tag.as_slice() {
                    b"string" => XmlRpcValue::Str(read_text(reader, b"string")?),
                    b"i4" | b"int" => {
                        let text = read_text(reader, &tag)?;
                        let code = text
                            .trim()
                            .parse::<i32>()
                            .map_err(|_| malformed(format!("bad integer '{}'", text)))?;
                        XmlRpcValue::Int(code)
                    }
                    b"array" => XmlRpcValue::Array(read_array(reader)?),
                    b"struct" => XmlRpcValue::Struct(read_struct(reader)?),
                    _ => XmlRpcValue::Other(read_text(reader, &tag)?),
                });
            }
            Event::Empty(e) => {
                typed = Some(match e.local_name().as_ref() {
                    b"string" => XmlRpcValue::Str(String::new()),
                    b"array" => XmlRpcValue::Array(Vec::new()),
                    b"struct" => XmlRpcValue::Struct(Vec::new()),
                    _ => XmlRpcValue::Other(String::new()),
                });
            }
            Event::End(e) if e.local_name().as_ref() == b"value" => {
                return Ok(typed.unwrap_or(XmlRpcValue::Str(untyped)));
            }
            Event::Eof => return Err(malformed("unterminated <value>")),
            _ => {}
        }
    }
}

fn read_text(reader: &mut Reader<&[u8]>, end: &[u8]) -> Result<String> {
    let mut text = String::new();
    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Text(e) => text.push_str(&e.decode().map_err(xml_error)?),
            Event::CData(e) => text.push_str(&e.decode().map_err(xml_error)?),
            Event::GeneralRef(e) => push_entity(&mut text, &e)?,
            Event::End(e) if e.local_name().as_ref() == end => return Ok(text),
            Event::Eof => return Err(malformed("unterminated scalar")),
            _ => {}
        }
    }
}

fn read_array(reader: &mut Reader<&[u8]>) -> Result<Vec<XmlRpcValue>> {
    let mut items = Vec::new();
    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(e) if e.local_name().as_ref() == b"value" => {
                items.push(read_value(reader)?)
            }
            Event::Empty(e) if e.local_name().as_ref() == b"value" => {
                items.push(XmlRpcValue::Str(String::new()))
            }
            Event::End(e) if e.local_name().as_ref() == b"array" => return Ok(items),
            Event::Eof => return Err(malformed("unterminated <array>")),
            _ => {}
        }
    }
}

fn read_struct(reader: &mut Reader<&[u8]>) -> Result<Vec<(String, XmlRpcValue)>> {
    let mut members = Vec::new();
    let mut name = String::new();
    let mut value = None;

    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"member" => {
                    name.clear();
                    value = None;
                }
                b"name" => name = read_text(reader, b"name")?.trim().to_string(),
                b"value" => value = Some(read_value(reader)?),
                _ => {}
            },
            Event::Empty(e) if e.local_name().as_ref() == b"value" => {
                value = Some(XmlRpcValue::Str(String::new()))
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"member" => {
                    if let Some(value) = value.take() {
                        members.push((std::mem::take(&mut name), value));
                    }
                }
                b"struct" => return Ok(members),
                _ => {}
            },
            Event::Eof => return Err(malformed("unterminated <struct>")),
            _ => {}
        }
    }
}

fn push_entity(buf: &mut String, entity: &BytesRef<'_>) -> Result<()> {
    if let Some(ch) = entity.resolve_char_ref().map_err(xml_error)? {
        buf.push(ch);
        return Ok(());
    }

    let name = entity.decode().map_err(xml_error)?;
    match resolve_predefined_entity(&name) {
        Some(text) => {
            buf.push_str(text);
            Ok(())
        }
        None => Err(malformed(format!("unknown entity &{};", name))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OK_RESPONSE: &str = r#"<?xml version="1.0"?>
<methodResponse><params><param><value><array><data>
<value><i4>1</i4></value>
<value><string></string></value>
<value><string>http://10.0.0.5:11311/</string></value>
</data></array></value></param></params></methodResponse>"#;

    const INDENTED_RESPONSE: &str = r#"<?xml version="1.0"?>
<methodResponse>
  <params>
    <param>
      <value>
        <array>
          <data>
            <value>
              <int>1</int>
            </value>
            <value>
              <string>Success</string>
            </value>
            <value>
              <string>http://m:11311/</string>
            </value>
          </data>
        </array>
      </value>
    </param>
  </params>
</methodResponse>"#;

    #[test]
    fn test_encode_call_escapes_params() {
        let body = String::from_utf8(encode_call("getUri", &["/a&b<c>"]).unwrap()).unwrap();
        assert!(body.starts_with("<?xml version=\"1.0\"?>"));
        assert!(body.contains("<methodName>getUri</methodName>"));
        assert!(body.contains("<string>/a&amp;b&lt;c&gt;</string>"));
    }

    #[test]
    fn test_encoded_call_reads_back() {
        let body = String::from_utf8(encode_call("getUri", &["/chooser"]).unwrap()).unwrap();
        let mut reader = Reader::from_str(&body);
        let mut method = None;
        loop {
            match reader.read_event().unwrap() {
                Event::Start(e) if e.local_name().as_ref() == b"methodName" => {
                    method = Some(read_text(&mut reader, b"methodName").unwrap());
                }
                Event::Start(e) if e.local_name().as_ref() == b"value" => {
                    assert_eq!(
                        read_value(&mut reader).unwrap(),
                        XmlRpcValue::Str("/chooser".to_string())
                    );
                }
                Event::Eof => break,
                _ => {}
            }
        }
        assert_eq!(method.as_deref(), Some("getUri"));
    }

    #[test]
    fn test_parse_success() {
        let identity = parse_identity(OK_RESPONSE).unwrap();
        assert_eq!(identity.status_code, 1);
        assert_eq!(identity.status_message, "");
        assert_eq!(identity.master_uri, "http://10.0.0.5:11311/");
    }

    #[test]
    fn test_parse_indented_reply() {
        let identity = parse_identity(INDENTED_RESPONSE).unwrap();
        assert_eq!(identity.status_code, 1);
        assert_eq!(identity.status_message, "Success");
        assert_eq!(identity.master_uri, "http://m:11311/");
    }

    #[test]
    fn test_parse_self_closing_empty_strings() {
        let body = "<methodResponse><params><param><value><array><data>\
            <value><i4>1</i4></value><value><string/></value>\
            <value><string>http://m:11311/</string></value>\
            </data></array></value></param></params></methodResponse>";
        let identity = parse_identity(body).unwrap();
        assert_eq!(identity.status_message, "");
        assert_eq!(identity.master_uri, "http://m:11311/");

        let body = body.replace("<value><string/></value>", "<value/>");
        let identity = parse_identity(&body).unwrap();
        assert_eq!(identity.status_message, "");
        assert_eq!(identity.master_uri, "http://m:11311/");
    }

    #[test]
    fn test_parse_untyped_strings() {
        let body = "<methodResponse><params><param><value><array><data>\
            <value><int>1</int></value><value>ok</value><value>http://m:11311/?a=1&amp;b=2</value>\
            </data></array></value></param></params></methodResponse>";
        let identity = parse_identity(body).unwrap();
        assert_eq!(identity.status_message, "ok");
        assert_eq!(identity.master_uri, "http://m:11311/?a=1&b=2");
    }

    #[test]
    fn test_parse_failure_status() {
        let body = OK_RESPONSE.replace("<i4>1</i4>", "<i4>-1</i4>");
        let err = parse_identity(&body).unwrap_err();
        assert!(matches!(err, ChooserError::RemoteStatusError { code: -1, .. }));
    }

    #[test]
    fn test_parse_fault() {
        let body = "<methodResponse><fault><value><struct>\
            <member><name>faultCode</name><value><int>4</int></value></member>\
            <member><name>faultString</name><value><string>no such method &amp; stuff</string></value></member>\
            </struct></value></fault></methodResponse>";
        let err = parse_identity(body).unwrap_err();
        match err {
            ChooserError::RemoteStatusError { message, .. } => {
                assert_eq!(message, "no such method & stuff")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_parse_rejects_non_xmlrpc() {
        for body in ["<html>hello</html>", "", "<methodResponse><params>"] {
            let err = parse_identity(body).unwrap_err();
            assert!(
                matches!(err, ChooserError::MalformedResponseError { .. }),
                "{body:?} gave {err:?}"
            );
        }
    }
}

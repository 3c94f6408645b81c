//! Loopback tests against a minimal blocking fake simulator.

use sceneflow_transport::{Envelope, Node, TransportError};
use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::time::Duration;

use sceneflow_core::{
    Geometry, LinkDescription, ModelDescription, Pose, PoseBatch, SceneDescription, Vec3,
    VisualDescription,
};

fn write_envelope(stream: &mut TcpStream, envelope: &Envelope) {
    let mut line = serde_json::to_string(envelope).expect("encode envelope");
    line.push('\n');
    stream.write_all(line.as_bytes()).expect("write envelope");
}

fn read_envelope(reader: &mut BufReader<TcpStream>) -> Envelope {
    let mut line = String::new();
    reader.read_line(&mut line).expect("read line");
    serde_json::from_str(line.trim()).expect("decode envelope")
}

fn sample_scene() -> SceneDescription {
    SceneDescription {
        name: "loopback".to_string(),
        ambient: None,
        background: None,
        models: vec![ModelDescription {
            id: 1,
            name: "crate".to_string(),
            pose: Some(Pose::from_translation(Vec3::new(0.0, 0.0, 0.5))),
            links: vec![LinkDescription {
                id: 2,
                name: "body".to_string(),
                pose: None,
                visuals: vec![VisualDescription {
                    id: 3,
                    name: "shell".to_string(),
                    pose: None,
                    geometry: Geometry::Box { size: Vec3::ONE },
                    material: None,
                    transparency: 0.0,
                }],
                lights: vec![],
            }],
            models: vec![],
        }],
        lights: vec![],
    }
}

/// Bind a listener, hand its accepted stream to the server closure. Joining
/// the returned handle surfaces assertion failures from the server side.
fn spawn_server<F>(server: F) -> (String, std::thread::JoinHandle<()>)
where
    F: FnOnce(TcpStream) + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("local addr").to_string();
    let join = std::thread::spawn(move || {
        let (stream, _) = listener.accept().expect("accept");
        server(stream);
    });
    (addr, join)
}

#[test]
fn test_request_scene_roundtrip() {
    let (addr, server) = spawn_server(|stream| {
        let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));
        let mut writer = stream;
        match read_envelope(&mut reader) {
            Envelope::Request { id, service, .. } => {
                assert_eq!(service, "/scene");
                write_envelope(
                    &mut writer,
                    &Envelope::Response {
                        id,
                        ok: true,
                        payload: serde_json::to_value(sample_scene()).expect("encode scene"),
                    },
                );
            }
            other => panic!("expected request, got {:?}", other),
        }
    });

    let node = Node::connect(&addr).expect("connect");
    let scene = node
        .request_scene("/scene", Duration::from_secs(2))
        .expect("scene request");
    assert_eq!(scene.name, "loopback");
    assert_eq!(scene.models[0].links[0].visuals[0].id, 3);

    server.join().expect("server");
}

#[test]
fn test_request_timeout() {
    let (addr, server) = spawn_server(|stream| {
        // Read the request but never answer, keeping the socket open.
        let mut reader = BufReader::new(stream);
        let mut line = String::new();
        let _ = reader.read_line(&mut line);
        std::thread::sleep(Duration::from_secs(2));
    });

    let node = Node::connect(&addr).expect("connect");
    let result = node.request_scene("/scene", Duration::from_millis(200));
    assert!(matches!(result, Err(TransportError::Timeout(_))));
    drop(server);
}

#[test]
fn test_service_failure_response() {
    let (addr, server) = spawn_server(|stream| {
        let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));
        let mut writer = stream;
        if let Envelope::Request { id, .. } = read_envelope(&mut reader) {
            write_envelope(
                &mut writer,
                &Envelope::Response {
                    id,
                    ok: false,
                    payload: serde_json::Value::Null,
                },
            );
        }
    });

    let node = Node::connect(&addr).expect("connect");
    let result = node.request_scene("/scene", Duration::from_secs(2));
    assert!(matches!(result, Err(TransportError::ServiceFailure(_))));

    server.join().expect("server");
}

#[test]
fn test_pose_subscription_delivers_batches() {
    let (addr, server) = spawn_server(|stream| {
        let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));
        let mut writer = stream;
        match read_envelope(&mut reader) {
            Envelope::Subscribe { topic } => assert_eq!(topic, "/pose"),
            other => panic!("expected subscribe, got {:?}", other),
        }
        let batch = PoseBatch {
            poses: vec![(3, Pose::from_translation(Vec3::new(1.0, 0.0, 0.0)))],
        };
        write_envelope(
            &mut writer,
            &Envelope::Publication {
                topic: "/pose".to_string(),
                payload: serde_json::to_value(batch).expect("encode batch"),
            },
        );
    });

    let node = Node::connect(&addr).expect("connect");
    let rx = node.subscribe_poses("/pose");
    let batch = rx.recv_timeout(Duration::from_secs(2)).expect("batch");
    assert_eq!(batch.poses.len(), 1);
    assert_eq!(batch.poses[0].0, 3);

    server.join().expect("server");
}

#[test]
fn test_advertised_service_answers() {
    let (addr, server) = spawn_server(|stream| {
        let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));
        let mut writer = stream;
        match read_envelope(&mut reader) {
            Envelope::Advertise { service } => assert_eq!(service, "/gui/screenshot"),
            other => panic!("expected advertise, got {:?}", other),
        }
        write_envelope(
            &mut writer,
            &Envelope::Request {
                id: 42,
                service: "/gui/screenshot".to_string(),
                payload: serde_json::json!("/tmp/shots"),
            },
        );
        match read_envelope(&mut reader) {
            Envelope::Response { id, ok, .. } => {
                assert_eq!(id, 42);
                assert!(ok);
            }
            other => panic!("expected response, got {:?}", other),
        }
    });

    let node = Node::connect(&addr).expect("connect");
    let requests = node.advertise("/gui/screenshot");
    let request = requests.recv_timeout(Duration::from_secs(2)).expect("call");
    assert_eq!(request.payload, serde_json::json!("/tmp/shots"));
    request.respond(true);

    // The server only returns once it has read the response line.
    server.join().expect("server");
}

#[test]
fn test_unadvertised_service_is_refused() {
    let (addr, server) = spawn_server(|stream| {
        let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));
        let mut writer = stream;
        write_envelope(
            &mut writer,
            &Envelope::Request {
                id: 7,
                service: "/nope".to_string(),
                payload: serde_json::Value::Null,
            },
        );
        match read_envelope(&mut reader) {
            Envelope::Response { id, ok, .. } => {
                assert_eq!(id, 7);
                assert!(!ok);
            }
            other => panic!("expected response, got {:?}", other),
        }
    });

    let _node = Node::connect(&addr).expect("connect");
    // The server returns once it has read the ok = false response.
    server.join().expect("server");
}

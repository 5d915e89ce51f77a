pub mod common {
    tonic::include_proto!("campus.canteen.common");
}

pub mod canteen_service {
    tonic::include_proto!("campus.canteen.canteen_service");
}
